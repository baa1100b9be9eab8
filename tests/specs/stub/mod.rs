mod session;
mod transport;
