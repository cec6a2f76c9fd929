pub mod cross_validator;
