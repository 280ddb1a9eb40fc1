pub mod doctor;
pub mod lookup;
pub mod onboard;
pub mod run;
