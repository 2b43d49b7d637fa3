//! GymWay server side: the document server and its administration helpers.

pub mod server;
