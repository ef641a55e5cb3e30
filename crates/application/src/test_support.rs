use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opsgate_core::{AppError, AppResult};
use opsgate_domain::{
    AuditEntry, AuditHistoryQuery, ConnectParams, LockState, OperationCatalog, OperationCategory,
    OperationDescriptor, OperationDescriptorInput, RouteKey,
};

use crate::gateway_ports::{
    AuditLogRepository, CatalogSource, CommandOutput, CommandRunner, DeployLockRepository,
    RemoteDesktopGateway, RemoteSession,
};

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn route_key(path: &str) -> RouteKey {
    RouteKey::parse_path(path).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn descriptor(path: &str, category: OperationCategory) -> OperationDescriptor {
    OperationDescriptor::new(
        route_key(path),
        OperationDescriptorInput {
            command: format!("echo {path}"),
            category,
            ..OperationDescriptorInput::default()
        },
    )
}

pub(crate) fn descriptor_with(path: &str, input: OperationDescriptorInput) -> OperationDescriptor {
    OperationDescriptor::new(route_key(path), input)
}

pub(crate) fn output(returncode: i32, stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_owned(),
        stderr: String::new(),
        returncode,
        duration_ms: 3,
    }
}

struct CatalogState {
    operations: Vec<OperationDescriptor>,
    modified_at: Option<DateTime<Utc>>,
    fail_loads: bool,
}

pub(crate) struct FakeCatalogSource {
    state: Mutex<CatalogState>,
}

impl FakeCatalogSource {
    pub(crate) fn missing() -> Self {
        Self {
            state: Mutex::new(CatalogState {
                operations: Vec::new(),
                modified_at: None,
                fail_loads: true,
            }),
        }
    }

    pub(crate) fn with_operations(operations: Vec<OperationDescriptor>) -> Self {
        Self {
            state: Mutex::new(CatalogState {
                operations,
                modified_at: Some(Utc::now()),
                fail_loads: false,
            }),
        }
    }

    pub(crate) fn replace_operations(
        &self,
        operations: Vec<OperationDescriptor>,
        modified_at: DateTime<Utc>,
    ) {
        let mut state = locked(&self.state);
        state.operations = operations;
        state.modified_at = Some(modified_at);
    }

    pub(crate) fn fail_loads(&self) {
        let mut state = locked(&self.state);
        state.fail_loads = true;
        state.modified_at = Some(Utc::now() + chrono::Duration::seconds(60));
    }
}

#[async_trait]
impl CatalogSource for FakeCatalogSource {
    fn location(&self) -> String {
        "memory".to_owned()
    }

    async fn modified_at(&self) -> AppResult<DateTime<Utc>> {
        locked(&self.state)
            .modified_at
            .ok_or_else(|| AppError::CatalogLoad("catalog source missing".to_owned()))
    }

    async fn load(&self) -> AppResult<OperationCatalog> {
        let state = locked(&self.state);
        if state.fail_loads {
            return Err(AppError::CatalogLoad("catalog source unreadable".to_owned()));
        }

        Ok(OperationCatalog::new(
            state.operations.clone(),
            state.modified_at,
            Utc::now(),
        ))
    }
}

#[derive(Default)]
pub(crate) struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub(crate) fn entries(&self) -> Vec<AuditEntry> {
        locked(&self.entries).clone()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> AppResult<()> {
        locked(&self.entries).push(entry.clone());
        Ok(())
    }

    async fn read_history(&self, query: &AuditHistoryQuery) -> AppResult<Vec<AuditEntry>> {
        let entries = locked(&self.entries).clone();
        Ok(query.collect(entries.into_iter().rev()))
    }

    async fn clear(&self) -> AppResult<()> {
        locked(&self.entries).clear();
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryLockRepository {
    state: Mutex<LockState>,
}

impl InMemoryLockRepository {
    pub(crate) fn holding(state: LockState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub(crate) fn stored(&self) -> LockState {
        locked(&self.state).clone()
    }
}

#[async_trait]
impl DeployLockRepository for InMemoryLockRepository {
    async fn load(&self) -> AppResult<LockState> {
        Ok(locked(&self.state).clone())
    }

    async fn save(&self, state: &LockState) -> AppResult<()> {
        *locked(&self.state) = state.clone();
        Ok(())
    }
}

/// Runner replaying scripted outputs and recording every invocation.
#[derive(Default)]
pub(crate) struct ScriptedCommandRunner {
    outputs: Mutex<VecDeque<AppResult<CommandOutput>>>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl ScriptedCommandRunner {
    pub(crate) fn replying(outputs: Vec<AppResult<CommandOutput>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Duration)> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommandRunner {
    async fn run(&self, command: &str, timeout: Duration) -> AppResult<CommandOutput> {
        locked(&self.calls).push((command.to_owned(), timeout));
        locked(&self.outputs)
            .pop_front()
            .unwrap_or_else(|| Ok(output(0, "ok")))
    }
}

pub(crate) const GATEWAY_SESSION_TOKEN: &str = "gw-session-token-7f3a";

#[derive(Default)]
pub(crate) struct FakeGateway {
    fail: bool,
    created: Mutex<Vec<ConnectParams>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn created(&self) -> Vec<ConnectParams> {
        locked(&self.created).clone()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        locked(&self.deleted).clone()
    }
}

#[async_trait]
impl RemoteDesktopGateway for FakeGateway {
    async fn create_connection(&self, params: &ConnectParams) -> AppResult<RemoteSession> {
        if self.fail {
            return Err(AppError::GatewayUnavailable(
                "gateway returned 500".to_owned(),
            ));
        }

        locked(&self.created).push(params.clone());
        Ok(RemoteSession {
            connection_id: "42".to_owned(),
            client_url: format!(
                "https://gateway.example.com/#/client/{}?token={GATEWAY_SESSION_TOKEN}",
                params.hostname
            ),
        })
    }

    async fn delete_connection(&self, connection_id: &str) -> AppResult<()> {
        locked(&self.deleted).push(connection_id.to_owned());
        Ok(())
    }
}
