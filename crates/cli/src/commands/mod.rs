pub mod doctor;
pub mod extract;
pub mod onboard;
pub mod serve;
pub mod studies;
