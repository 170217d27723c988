pub mod theater;
