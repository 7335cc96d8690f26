//! Background tasks for the HTTP presentation layer

mod counter_purger;
mod fault_sweeper;

pub use counter_purger::spawn_counter_purger;
pub use fault_sweeper::spawn_fault_sweeper;
