//! Scripted in-memory `Backend` for workflow tests
//!
//! Each endpoint answers from a queue of scripted results and falls back to a
//! successful default once the queue is empty. Every call is recorded so tests
//! can assert exactly which requests a workflow made.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use gamepromo::{
    AccountToken, Backend, BackendFuture, DailyState, Error, InterludeUser, Promo,
    PromosResponse, Result, SessionToken,
};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GetPromos {
        account: String,
    },
    ApplyPromo {
        account: String,
        code: String,
    },
    LoginClient {
        promo_id: String,
        client_id: Uuid,
    },
    RegisterEvent {
        session: String,
        promo_id: String,
        event_id: Uuid,
    },
    CreateCode {
        session: String,
        promo_id: String,
    },
}

impl Call {
    pub(crate) fn endpoint(&self) -> &'static str {
        match self {
            Call::GetPromos { .. } => "get-promos",
            Call::ApplyPromo { .. } => "apply-promo",
            Call::LoginClient { .. } => "login-client",
            Call::RegisterEvent { .. } => "register-event",
            Call::CreateCode { .. } => "create-code",
        }
    }
}

/// Build a `get-promos` body from `(promo_id, keys_per_day, received_today)`.
pub(crate) fn promos(entries: &[(&str, u32, u32)]) -> PromosResponse {
    PromosResponse {
        promos: Some(
            entries
                .iter()
                .map(|(id, keys, _)| Promo {
                    promo_id: id.to_string(),
                    keys_per_day: *keys,
                })
                .collect(),
        ),
        states: Some(
            entries
                .iter()
                .map(|(id, _, received)| DailyState {
                    promo_id: id.to_string(),
                    receive_keys_today: *received,
                })
                .collect(),
        ),
    }
}

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    promos_by_account: HashMap<String, Result<PromosResponse>>,
    default_promos: Option<Result<PromosResponse>>,
    logins: Mutex<VecDeque<Result<String>>>,
    registrations: Mutex<VecDeque<Result<bool>>>,
    codes: Mutex<VecDeque<Result<String>>>,
    applies: Mutex<VecDeque<Result<InterludeUser>>>,
    stalled_promos: HashSet<String>,
    calls: Mutex<Vec<Call>>,
    counter: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_promos(mut self, response: PromosResponse) -> Self {
        self.default_promos = Some(Ok(response));
        self
    }

    pub(crate) fn with_promos_error(mut self, error: Error) -> Self {
        self.default_promos = Some(Err(error));
        self
    }

    pub(crate) fn with_promos_for(mut self, account: &str, response: PromosResponse) -> Self {
        self.promos_by_account
            .insert(account.to_string(), Ok(response));
        self
    }

    pub(crate) fn script_logins(self, results: impl IntoIterator<Item = Result<String>>) -> Self {
        self.logins.lock().unwrap().extend(results);
        self
    }

    pub(crate) fn script_registrations(
        self,
        results: impl IntoIterator<Item = Result<bool>>,
    ) -> Self {
        self.registrations.lock().unwrap().extend(results);
        self
    }

    pub(crate) fn script_codes(self, results: impl IntoIterator<Item = Result<String>>) -> Self {
        self.codes.lock().unwrap().extend(results);
        self
    }

    pub(crate) fn script_applies(
        self,
        results: impl IntoIterator<Item = Result<InterludeUser>>,
    ) -> Self {
        self.applies.lock().unwrap().extend(results);
        self
    }

    /// `register-event` never reports a code for this promotion.
    pub(crate) fn stall_promo(mut self, promo_id: &str) -> Self {
        self.stalled_promos.insert(promo_id.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Endpoint names in call order.
    pub(crate) fn endpoints(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(Call::endpoint).collect()
    }

    pub(crate) fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Backend for ScriptedBackend {
    fn get_promos<'a>(&'a self, account: &'a AccountToken) -> BackendFuture<'a, PromosResponse> {
        self.record(Call::GetPromos {
            account: account.bearer().to_string(),
        });
        let result = self
            .promos_by_account
            .get(account.bearer())
            .or(self.default_promos.as_ref())
            .cloned()
            .unwrap_or_else(|| Ok(PromosResponse::default()));
        Box::pin(std::future::ready(result))
    }

    fn apply_promo<'a>(
        &'a self,
        account: &'a AccountToken,
        code: &'a str,
    ) -> BackendFuture<'a, InterludeUser> {
        self.record(Call::ApplyPromo {
            account: account.bearer().to_string(),
            code: code.to_string(),
        });
        let result = self.applies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(InterludeUser {
                id: Some("user".into()),
                balance_diamonds: Some(self.next_id() as f64 * 10.0),
            })
        });
        Box::pin(std::future::ready(result))
    }

    fn login_client<'a>(
        &'a self,
        promo_id: &'a str,
        client_id: Uuid,
    ) -> BackendFuture<'a, SessionToken> {
        self.record(Call::LoginClient {
            promo_id: promo_id.to_string(),
            client_id,
        });
        let result = self
            .logins
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("session-{}", self.next_id())))
            .and_then(|token| SessionToken::new(token).ok_or(Error::Empty("clientToken")));
        Box::pin(std::future::ready(result))
    }

    fn register_event<'a>(
        &'a self,
        session: &'a SessionToken,
        promo_id: &'a str,
        event_id: Uuid,
    ) -> BackendFuture<'a, bool> {
        self.record(Call::RegisterEvent {
            session: session.bearer().to_string(),
            promo_id: promo_id.to_string(),
            event_id,
        });
        let result = if self.stalled_promos.contains(promo_id) {
            Ok(false)
        } else {
            self.registrations
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(true))
        };
        Box::pin(std::future::ready(result))
    }

    fn create_code<'a>(
        &'a self,
        session: &'a SessionToken,
        promo_id: &'a str,
    ) -> BackendFuture<'a, String> {
        self.record(Call::CreateCode {
            session: session.bearer().to_string(),
            promo_id: promo_id.to_string(),
        });
        let result = self
            .codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("CODE-{}", self.next_id())));
        Box::pin(std::future::ready(result))
    }
}
