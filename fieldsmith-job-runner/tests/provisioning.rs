use fieldsmith_config::{remote, retention, two_factor, Configuration};
use fieldsmith_core::{
    consts::selectors,
    traits::{NoGeneration, RemoteDriver, RemoteSession, SessionError},
};
use fieldsmith_db::{
    model::{
        execution_log::LogFilter,
        job::{CompanyProfile, JobState},
        workspace::Workspace,
    },
    Db,
};
use fieldsmith_job_runner::run_dispatcher;
use fieldsmith_jobs::JobRunnerContext;
use fieldsmith_service::{
    automation::{AutomationService, SubmitAutomation},
    dispatch::DispatchHandle,
    execution_log::ExecutionLogService,
    queue::TenantQueue,
    relay::TwoFactorRelay,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use uuid::Uuid;

#[derive(Clone, Default)]
struct MockDriver {
    challenge: bool,
    accepted_code: Option<&'static str>,
    fail_values: Vec<&'static str>,
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    filled: Vec<(String, String)>,
    code_buffer: String,
    submitted_code: Option<String>,
    authenticated: bool,
    sessions_closed: usize,
}

struct MockSession {
    driver: MockDriver,
}

impl MockDriver {
    fn visible(&self, marker: &str) -> bool {
        let state = self.state.lock();
        match marker {
            selectors::SEND_SECURITY_CODE_BUTTON => self.challenge && !state.authenticated,
            selectors::INVALID_CODE_MARKER => {
                state.submitted_code.is_some() && !state.authenticated
            }
            selectors::DASHBOARD_MARKER => !self.challenge || state.authenticated,
            _ => true,
        }
    }

    fn filled_values(&self) -> Vec<(String, String)> {
        self.state.lock().filled.clone()
    }

    fn sessions_closed(&self) -> usize {
        self.state.lock().sessions_closed
    }
}

impl RemoteDriver for MockDriver {
    type Session = MockSession;

    async fn open(&self) -> Result<Self::Session, SessionError> {
        Ok(MockSession {
            driver: self.clone(),
        })
    }
}

impl RemoteSession for MockSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), SessionError> {
        if self.driver.fail_values.iter().any(|poison| *poison == value) {
            return Err(SessionError::Remote(format!(
                "update of {selector} was rejected"
            )));
        }

        let mut state = self.driver.state.lock();
        state.filled.push((selector.to_owned(), value.to_owned()));
        if selector.contains("> .m-2") {
            state.code_buffer.push_str(value);
        }

        Ok(())
    }

    async fn click(&mut self, _selector: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn press(&mut self, key: &str) -> Result<(), SessionError> {
        if key == "Enter" {
            let mut state = self.driver.state.lock();
            let code = std::mem::take(&mut state.code_buffer);
            state.authenticated = self.driver.accepted_code == Some(code.as_str());
            state.submitted_code = Some(code);
        }

        Ok(())
    }

    async fn wait_for(&mut self, marker: &str, _timeout: Duration) -> Result<bool, SessionError> {
        Ok(self.driver.visible(marker))
    }

    async fn is_visible(&mut self, marker: &str) -> Result<bool, SessionError> {
        Ok(self.driver.visible(marker))
    }

    async fn read_text(&mut self, _selector: &str) -> Result<String, SessionError> {
        Ok(String::new())
    }

    async fn close(&mut self) {
        self.driver.state.lock().sessions_closed += 1;
    }
}

struct Harness {
    db: Db,
    automation: AutomationService<NoGeneration>,
    logs: ExecutionLogService,
    driver: MockDriver,
    workspace: Workspace,
}

fn test_config(two_factor_timeout_secs: u64) -> Configuration {
    Configuration {
        remote: remote::Configuration {
            base_url: "https://portal.test".into(),
            element_wait_secs: 1,
            page_load_secs: 1,
            challenge_wait_secs: 1,
        },
        two_factor: two_factor::Configuration {
            timeout_secs: two_factor_timeout_secs,
            verify_interval_secs: 0,
            verify_attempts: 3,
        },
        retention: retention::Configuration::default(),
    }
}

fn harness(driver: MockDriver, config: Configuration) -> Harness {
    let db = Db::default();
    let (dispatch, requests) = DispatchHandle::channel();

    let relay = TwoFactorRelay::builder().db(db.clone()).build();
    let logs = ExecutionLogService::builder().db(db.clone()).build();
    let automation = AutomationService::builder()
        .db(db.clone())
        .queue(TenantQueue::default())
        .relay(relay.clone())
        .dispatch(dispatch)
        .text_generator(NoGeneration)
        .build();

    let ctx = Arc::new(JobRunnerContext {
        db: db.clone(),
        relay,
        logs: logs.clone(),
        driver: driver.clone(),
        config,
    });
    tokio::spawn(run_dispatcher(ctx, automation.clone(), requests));

    let workspace = Workspace::builder()
        .name("acme")
        .subscription_active(true)
        .build();
    db.insert_workspace(workspace.clone());

    Harness {
        db,
        automation,
        logs,
        driver,
        workspace,
    }
}

fn submission(workspace_id: Uuid) -> SubmitAutomation {
    SubmitAutomation::builder()
        .workspace_id(workspace_id)
        .caller_id(Uuid::now_v7())
        .email("owner@example.com")
        .password("hunter2")
        .subaccount_id("sub-1")
        .build()
}

fn custom_values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

async fn wait_for_state(db: &Db, job_id: Uuid, state: JobState) {
    for _ in 0..1000 {
        if db.job(job_id).unwrap().state == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    panic!(
        "job never reached {state}, stuck in {}",
        db.job(job_id).unwrap().state
    );
}

fn log_messages(harness: &Harness, job_id: Uuid) -> Vec<String> {
    harness
        .logs
        .logs_for_job(job_id, &LogFilter::default())
        .into_iter()
        .map(|entry| entry.message)
        .collect()
}

#[tokio::test]
async fn single_field_run_completes() {
    let harness = harness(MockDriver::default(), test_config(600));

    let mut request = submission(harness.workspace.id);
    request.custom_values = custom_values(&[("Company Name", "Acme")]);

    let receipt = harness.automation.submit(request).await.unwrap();
    assert!(receipt.started_immediately);

    wait_for_state(&harness.db, receipt.job.id, JobState::Completed).await;

    let job = harness.db.job(receipt.job.id).unwrap();
    assert_eq!(job.progress, 100);
    assert!(job.completed_at.is_some());
    assert!(job.error_message.is_none());

    let messages = log_messages(&harness, receipt.job.id);
    assert!(messages.contains(&"Processing field: Company Name".to_owned()));
    assert!(messages.contains(&"Provisioning completed successfully".to_owned()));

    assert_eq!(harness.driver.sessions_closed(), 1);
}

#[tokio::test]
async fn back_to_back_jobs_chain_automatically() {
    let harness = harness(MockDriver::default(), test_config(600));

    let first = harness
        .automation
        .submit(submission(harness.workspace.id))
        .await
        .unwrap();
    let second = harness
        .automation
        .submit(submission(harness.workspace.id))
        .await
        .unwrap();

    assert!(first.started_immediately);
    assert!(!second.started_immediately);
    assert_eq!(second.position, 1);

    // the second run starts without any external trigger
    wait_for_state(&harness.db, first.job.id, JobState::Completed).await;
    wait_for_state(&harness.db, second.job.id, JobState::Completed).await;

    // strict FIFO: the first job was done before the second began
    let first_done = harness.db.job(first.job.id).unwrap().completed_at.unwrap();
    let second_started = harness.db.job(second.job.id).unwrap().started_at.unwrap();
    assert!(first_done <= second_started);

    assert_eq!(harness.automation.queue_status(harness.workspace.id).total, 0);
    assert_eq!(harness.driver.sessions_closed(), 2);
}

#[tokio::test]
async fn rejected_code_round_trip() {
    let driver = MockDriver {
        challenge: true,
        accepted_code: Some("123456"),
        ..MockDriver::default()
    };
    let harness = harness(driver, test_config(600));

    let mut request = submission(harness.workspace.id);
    request.custom_values = custom_values(&[("Company Name", "Acme")]);

    let receipt = harness.automation.submit(request).await.unwrap();
    wait_for_state(&harness.db, receipt.job.id, JobState::WaitingTwoFactor).await;

    harness
        .automation
        .submit_two_factor_code(receipt.job.id, "000000")
        .unwrap();
    wait_for_state(&harness.db, receipt.job.id, JobState::ReenterTwoFactor).await;

    harness
        .automation
        .submit_two_factor_code(receipt.job.id, "123456")
        .unwrap();
    wait_for_state(&harness.db, receipt.job.id, JobState::Completed).await;

    let job = harness.db.job(receipt.job.id).unwrap();
    assert_eq!(job.progress, 100);
    assert_eq!(job.two_factor_code, None);
    assert!(harness.db.two_factor(receipt.job.id).is_none());

    let messages = log_messages(&harness, receipt.job.id);
    assert!(messages.contains(&"Security code rejected, waiting for a new one".to_owned()));
    assert!(messages.contains(&"Security code accepted".to_owned()));
}

#[tokio::test]
async fn code_deadline_fails_the_job_and_frees_the_queue() {
    let driver = MockDriver {
        challenge: true,
        accepted_code: Some("123456"),
        ..MockDriver::default()
    };
    let harness = harness(driver, test_config(0));

    let first = harness
        .automation
        .submit(submission(harness.workspace.id))
        .await
        .unwrap();
    let second = harness
        .automation
        .submit(submission(harness.workspace.id))
        .await
        .unwrap();

    wait_for_state(&harness.db, first.job.id, JobState::Failed).await;
    // the failed run must not stall the queue behind it
    wait_for_state(&harness.db, second.job.id, JobState::Failed).await;

    let job = harness.db.job(first.job.id).unwrap();
    assert!(job.failed_at.is_some());
    assert!(job
        .error_message
        .as_deref()
        .unwrap()
        .contains("security code"));

    assert_eq!(harness.automation.queue_status(harness.workspace.id).total, 0);
    assert_eq!(harness.driver.sessions_closed(), 2);
}

#[tokio::test]
async fn out_of_range_keys_are_never_written() {
    let harness = harness(MockDriver::default(), test_config(600));

    let mut request = submission(harness.workspace.id);
    request.custom_values = custom_values(&[("Service 13", "out of range"), ("Service 1", "Plumbing")]);

    let receipt = harness.automation.submit(request).await.unwrap();
    wait_for_state(&harness.db, receipt.job.id, JobState::Completed).await;

    let created_names: Vec<String> = harness
        .driver
        .filled_values()
        .into_iter()
        .filter(|(selector, _)| selector == selectors::NAME_INPUT)
        .map(|(_, value)| value)
        .collect();
    assert_eq!(created_names, vec!["Service 1".to_owned()]);

    let messages = log_messages(&harness, receipt.job.id);
    assert!(messages.iter().all(|message| !message.contains("Service 13")));

    assert_eq!(harness.db.job(receipt.job.id).unwrap().progress, 100);
}

#[tokio::test]
async fn derived_phone_fields_are_populated() {
    let harness = harness(MockDriver::default(), test_config(600));

    let mut request = submission(harness.workspace.id);
    request.company = CompanyProfile::builder()
        .name("Acme Plumbing")
        .phone("5551234567")
        .build();

    let receipt = harness.automation.submit(request).await.unwrap();
    wait_for_state(&harness.db, receipt.job.id, JobState::Completed).await;

    let messages = log_messages(&harness, receipt.job.id);
    assert!(messages.contains(&"Processing field: Company Phone (Aesthetic)".to_owned()));
    assert!(messages.contains(&"Processing field: Company Phone (Functional)".to_owned()));

    let written_values: Vec<String> = harness
        .driver
        .filled_values()
        .into_iter()
        .filter(|(selector, _)| selector == selectors::VALUE_INPUT)
        .map(|(_, value)| value)
        .collect();
    assert!(written_values.contains(&"(555) 123-4567".to_owned()));
    assert!(written_values.contains(&"15551234567".to_owned()));
}

#[tokio::test]
async fn failing_fields_are_logged_and_skipped() {
    let driver = MockDriver {
        fail_values: vec!["will not stick"],
        ..MockDriver::default()
    };
    let harness = harness(driver, test_config(600));

    let mut request = submission(harness.workspace.id);
    request.custom_values = custom_values(&[
        ("Service 1", "will not stick"),
        ("Service 2", "Heating"),
    ]);

    let receipt = harness.automation.submit(request).await.unwrap();
    wait_for_state(&harness.db, receipt.job.id, JobState::Completed).await;

    let job = harness.db.job(receipt.job.id).unwrap();
    assert_eq!(job.progress, 100);

    let messages = log_messages(&harness, receipt.job.id);
    assert!(messages
        .iter()
        .any(|message| message.starts_with("Failed to set field Service 1")));
    assert!(messages.contains(&"Processing field: Service 2".to_owned()));
    assert!(messages.contains(&"Provisioning completed successfully".to_owned()));
}

#[tokio::test]
async fn empty_field_map_still_completes() {
    let harness = harness(MockDriver::default(), test_config(600));

    let mut request = submission(harness.workspace.id);
    request.custom_values = custom_values(&[("Service 13", "out of range")]);

    let receipt = harness.automation.submit(request).await.unwrap();
    wait_for_state(&harness.db, receipt.job.id, JobState::Completed).await;

    let job = harness.db.job(receipt.job.id).unwrap();
    assert_eq!(job.progress, 100);

    let messages = log_messages(&harness, receipt.job.id);
    assert!(messages.contains(&"No custom values to process".to_owned()));
}
