pub mod intake;
pub mod verification;
