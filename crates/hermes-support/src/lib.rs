#![forbid(unsafe_code)]
//! Ambient concerns shared by every Hermes binary: logging initialization
//! and control-socket path allocation. Deliberately tiny and side-effect
//! light — no business logic lives here.

pub mod logging;
pub mod socket;

pub use socket::SocketError;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocate_creates_a_bindable_socket() {
        let base = tempfile::tempdir().unwrap();
        let (path, listener) = socket::allocate(base.path()).await.unwrap();
        assert!(path.starts_with(base.path()));
        assert!(path.to_string_lossy().ends_with(".sock"));
        drop(listener);
    }

    #[tokio::test]
    async fn allocate_is_collision_free_across_calls() {
        let base = tempfile::tempdir().unwrap();
        let (path_a, _a) = socket::allocate(base.path()).await.unwrap();
        let (path_b, _b) = socket::allocate(base.path()).await.unwrap();
        assert_ne!(path_a, path_b);
    }
}
