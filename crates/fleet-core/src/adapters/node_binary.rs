//! Command factories for the two external binaries.
//!
//! The argument lists below are the externally-fixed contract with the
//! geth-compatible node binary and its discovery bootnode. Nothing here
//! executes anything; factories emit [`CommandSpec`]s for a
//! `ProcessRunner` to run.

use std::path::PathBuf;

use crate::config::FleetConfig;
use crate::domain::entities::NodeRecord;
use crate::ports::outbound::CommandSpec;

/// JSON-RPC modules exposed on every sealer's HTTP endpoint.
const RPC_API_MODULES: &str = "personal,db,eth,net,web3,txpool,miner";
/// Gas ceiling the sealers mine toward.
const TARGET_GAS_LIMIT: &str = "94000000";
/// Minimum gas price a sealer accepts.
const GAS_PRICE: &str = "1";
/// Log verbosity the bootnode runs at.
const BOOTNODE_VERBOSITY: &str = "9";

/// Builds invocations of the node binary.
pub struct NodeBinary {
    program: PathBuf,
}

impl NodeBinary {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `account new`: mint the sealer's identity into its datadir,
    /// encrypted with the password file.
    pub fn create_account(&self, config: &FleetConfig, name: &str) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("--datadir")
            .path_arg(config.node_data_dir(name))
            .arg("account")
            .arg("new")
            .arg("--password")
            .path_arg(config.password_file(name))
    }

    /// `init`: rebuild the chain database from the genesis document.
    pub fn init_chain(&self, config: &FleetConfig, name: &str) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("--datadir")
            .path_arg(config.node_data_dir(name))
            .arg("init")
            .path_arg(&config.genesis_path)
    }

    /// The long-running sealer process: full sync, HTTP-RPC on the
    /// record's port, account unlocked and mining.
    pub fn run_sealer(&self, config: &FleetConfig, name: &str, record: &NodeRecord) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("--datadir")
            .path_arg(config.node_data_dir(name))
            .arg("--syncmode")
            .arg("full")
            .arg("--port")
            .arg(record.p2p_port.to_string())
            .arg("--rpc")
            .arg("--rpcaddr")
            .arg("localhost")
            .arg("--rpcport")
            .arg(record.rpc_port.to_string())
            .arg("--rpcapi")
            .arg(RPC_API_MODULES)
            .arg("--bootnodes")
            .arg(config.enode_url())
            .arg("--networkid")
            .arg(config.chain_id.to_string())
            .arg("--gasprice")
            .arg(GAS_PRICE)
            .arg("--unlock")
            .arg(record.address.prefixed_hex())
            .arg("--password")
            .path_arg(config.password_file(name))
            .arg("--mine")
            .arg("--targetgaslimit")
            .arg(TARGET_GAS_LIMIT)
            .log_stderr_to(config.node_log_file(name))
    }
}

/// Builds invocations of the discovery bootnode binary.
pub struct BootnodeBinary {
    program: PathBuf,
}

impl BootnodeBinary {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Discovery bootnode on its fixed port, chatty logs into the
    /// bootnode log file.
    pub fn run(&self, config: &FleetConfig) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("-nodekey")
            .path_arg(&config.bootnode_key)
            .arg("-verbosity")
            .arg(BOOTNODE_VERBOSITY)
            .arg("-addr")
            .arg(format!(":{}", config.bootnode_port))
            .log_stderr_to(config.bootnode_log.as_path())
    }
}
