pub mod notification;
pub mod passenger;

#[cfg(test)]
mod fakes;
