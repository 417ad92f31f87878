/*!

Provides utilities for running the functional tests against a throwaway `kind` cluster.
We call this testing modality `selftest` to distinguish it from the collector's own functional
tests, which can run against any cluster.

!*/

pub mod cluster;
mod test_settings;

pub use cluster::Cluster;
