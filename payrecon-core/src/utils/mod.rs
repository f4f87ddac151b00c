pub mod fake_identity;
