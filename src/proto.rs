//! Generated gNMI message types, compiled from `proto/gnmi.proto` by
//! `build.rs`. See that file for which subset of the gNMI wire format is
//! modelled.

include!(concat!(env!("OUT_DIR"), "/gnmi.rs"));
