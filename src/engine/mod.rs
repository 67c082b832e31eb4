pub mod bot;
pub mod generator;
pub mod hints;

#[cfg(test)]
mod tests;
