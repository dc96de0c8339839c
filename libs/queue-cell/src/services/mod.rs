pub mod queue;
pub mod wait_time;
