//! Display formatting for terminal output

pub mod people;

pub use people::{format_people_list, format_person_details};
