pub mod csv;
pub mod health;
