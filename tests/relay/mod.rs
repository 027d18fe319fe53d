mod broadcast_tests;
mod handshake_tests;
mod lifecycle_tests;
