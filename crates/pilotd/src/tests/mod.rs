//! Behavioural tests driving a whole bridge over real sockets.
