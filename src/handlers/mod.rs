// Handlers by security tier:
// public (no credentials) and protected (bearer token, principal resolved).
pub mod protected;
pub mod public;
