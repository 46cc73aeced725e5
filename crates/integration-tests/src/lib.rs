//! Postgres-backed integration tests for the api server live under `tests/`.
