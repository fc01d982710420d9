pub mod bot;
pub mod card;
pub mod combo_finder;
pub mod config;
pub mod dealer;
pub mod deck;
pub mod error;
pub mod game;
pub mod opening;
pub mod rules;
pub mod scoring;

#[cfg(test)]
mod tests_props;
