pub mod check;
pub mod diff;
pub mod history;
pub mod modules;
pub mod restore;
pub mod save;
pub mod scan;
pub mod score;
