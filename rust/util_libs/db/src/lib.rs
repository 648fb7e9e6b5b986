pub mod mongodb;
pub mod provisioner;
