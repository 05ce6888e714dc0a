pub mod repo_server;
