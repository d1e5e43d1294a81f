mod server;
mod support;
