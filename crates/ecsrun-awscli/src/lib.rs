mod aws_cli;

pub use aws_cli::AwsCliClient;
