pub mod echo;
pub mod greeting;
