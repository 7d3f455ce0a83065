//! Shared fixtures for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, TxHash, B256, U256};
use axiom_query::blockchain::{AccountState, BlockchainError, MemoryState, WalletBridge};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// Anvil's first account
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_SIGNER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

pub const UNI_V2_FACTORY: Address = address!("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
pub const STORAGE_HOLDER: Address = address!("0x6337b3caf9c5236c7f3d1694410776119edaf9fa");

/// Hash the mock node returns for every `eth_sendTransaction`.
pub const MOCK_TX_HASH: TxHash = TxHash::repeat_byte(0xab);

/// Chain state with the blocks and slots the tests query.
pub fn chain_state() -> MemoryState {
    let mut state = MemoryState::new()
        .with_block(6_779_167, B256::repeat_byte(0x02))
        .with_account(
            9_142_026,
            UNI_V2_FACTORY,
            AccountState {
                nonce: 1,
                balance: U256::ZERO,
                storage_root: B256::repeat_byte(0x33),
                code_hash: B256::repeat_byte(0x44),
            },
        )
        .with_storage(9_142_026, UNI_V2_FACTORY, U256::ZERO, U256::from(0xfee))
        .with_storage(6_779_167, STORAGE_HOLDER, U256::from(8), U256::from(0xbeef));
    // the demonstration query spans four consecutive blocks
    for (i, block) in (9_142_026..9_142_030).enumerate() {
        state = state.with_block(block, B256::repeat_byte(0x10 + i as u8));
    }
    state
}

/// Wallet bridge that counts calls and grants a fixed account list.
pub struct CountingBridge {
    pub endpoint: String,
    pub accounts: Vec<Address>,
    pub requests: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl Default for CountingBridge {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:1".to_string(),
            accounts: Vec::new(),
            requests: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }
}

impl CountingBridge {
    pub fn granting(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl WalletBridge for CountingBridge {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, BlockchainError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.clone())
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// JSON-RPC requests received by a mock node, in arrival order.
pub type RpcLog = Arc<Mutex<Vec<Value>>>;

/// Start a mock JSON-RPC node that accepts transactions from unlocked accounts.
///
/// Returns its URL and the log of received requests.
pub async fn start_mock_node() -> (String, RpcLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let log = RpcLog::default();

    let requests = log.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let requests = requests.clone();
            tokio::spawn(async move {
                let _ = serve_rpc(socket, requests).await;
            });
        }
    });

    (format!("http://{}", addr), log)
}

async fn serve_rpc(mut socket: TcpStream, log: RpcLog) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request: Value = serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null);
    let response = rpc_response(&request);
    log.lock().unwrap().push(request);

    let body = response.to_string();
    let reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    socket.write_all(reply.as_bytes()).await?;
    socket.shutdown().await
}

fn rpc_response(request: &Value) -> Value {
    let id = request["id"].clone();
    let result = match request["method"].as_str().unwrap_or_default() {
        "eth_chainId" => json!("0x5"),
        "eth_blockNumber" => json!("0x1"),
        "eth_getTransactionCount" => json!("0x0"),
        "eth_estimateGas" => json!("0x30d40"),
        "eth_gasPrice" => json!("0x174876e800"),
        "eth_sendTransaction" => json!(MOCK_TX_HASH),
        method => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("method {} not found", method) },
            })
        }
    };
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Params of every `method` call in `log`.
pub fn calls(log: &RpcLog, method: &str) -> Vec<Value> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|r| r["method"] == method)
        .map(|r| r["params"].clone())
        .collect()
}
