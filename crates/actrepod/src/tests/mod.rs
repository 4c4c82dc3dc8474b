//! Behavioural suites for the daemon.

mod process_behaviour;
mod socket_behaviour;
mod support;
