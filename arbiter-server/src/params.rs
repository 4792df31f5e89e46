use std::path::PathBuf;
use arbiter_core::{Identity, Peer};
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(about = "Blob storage node that agrees with its peers on who keeps each upload")]
pub struct Args {
    /// Identity of this node; it counts bytes equal to this value.
    #[clap(long, env = "BIT")]
    pub(crate) identity: Identity,
    #[clap(long, env = "HTTP_ADDR", default_value = "127.0.0.1:9000")]
    pub(crate) http_addr: String,
    #[clap(long, env = "DATA_DIR", default_value = "data")]
    pub(crate) data_dir: PathBuf,
    /// Every node of the deployment as IDENTITY=HOST:PORT, this one included.
    #[clap(long = "peer", env = "PEERS", value_delimiter = ',', required = true)]
    pub(crate) peers: Vec<Peer>,
    /// Number of identities; nodes are 0..IDENTITIES.
    #[clap(long, env = "IDENTITIES", default_value_t = 2)]
    pub(crate) identities: usize,
    #[clap(long, env = "MAX_UPLOAD_BYTES", default_value_t = 64 * 1024 * 1024)]
    pub(crate) max_upload_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_node_args() {
        let args = Args::try_parse_from([
            "arbiter-server",
            "--identity", "1",
            "--http-addr", "0.0.0.0:9001",
            "--peer", "0=node-a:9000",
            "--peer", "1=node-b:9001",
        ])
        .unwrap();

        assert_eq!(args.identity, Identity::new(1));
        assert_eq!(args.identities, 2);
        assert_eq!(args.peers.len(), 2);
        assert_eq!(args.peers[1].addr, "node-b:9001");
    }

    #[test]
    fn test_comma_separated_peers() {
        let args = Args::try_parse_from([
            "arbiter-server",
            "--identity", "0",
            "--peer", "0=a:1,1=b:2",
        ])
        .unwrap();
        assert_eq!(args.peers.iter().map(|p| p.identity.value()).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_rejects_bad_identity_and_peer() {
        assert!(Args::try_parse_from(["arbiter-server", "--identity", "x", "--peer", "0=a:1"]).is_err());
        assert!(Args::try_parse_from(["arbiter-server", "--identity", "0", "--peer", "a:1"]).is_err());
    }
}
