pub mod helpers;

mod user;
