use crate::infra::{operator, seed_sample_data, SeededPortfolio, CLI_OPERATOR};
use chrono::{Local, NaiveDate};
use clap::Args;
use rentwise::config::AppConfig;
use rentwise::domain::YearMonth;
use rentwise::error::AppError;
use rentwise::services::{ledger_csv, MemoryNotifier, ServiceError};
use rentwise::store::{ScopedStore, Store, StoreError};
use rentwise::tasks::{Message, MessageKind, Task, TaskManager, TaskQueue};
use rentwise::telemetry;
use rentwise::tenancy::{Actor, TenantScope, TenantStamp};
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct TaskRunArgs {
    /// Task name, e.g. generate_rent or close_expired_leases
    #[arg(value_parser = crate::infra::parse_task_name)]
    pub(crate) name: MessageKind,
    /// Organization the task runs for
    #[arg(long)]
    pub(crate) organization: u64,
    /// Narrow the task to one company of the organization
    #[arg(long)]
    pub(crate) company: Option<u64>,
    /// Reference date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date, conflicts_with = "period")]
    pub(crate) date: Option<NaiveDate>,
    /// Billing period (YYYY-MM); date-based tasks use its last day.
    #[arg(long, value_parser = crate::infra::parse_period)]
    pub(crate) period: Option<YearMonth>,
}

#[derive(Args, Debug)]
pub(crate) struct LedgerExportArgs {
    /// Organization whose ledger is exported
    #[arg(long)]
    pub(crate) organization: u64,
    /// Restrict the export to one company of the organization
    #[arg(long)]
    pub(crate) company: Option<u64>,
    /// Book entries up to this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) until: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Leave organization 1's rent uncollected so both organizations get reminders.
    #[arg(long)]
    pub(crate) skip_collection: bool,
}

/// In-memory store seeded with the sample portfolio, plus a task manager over it.
struct Sandbox {
    store: Arc<Store>,
    manager: Arc<TaskManager>,
    queue: TaskQueue,
    notifier: MemoryNotifier,
    seeded: Vec<SeededPortfolio>,
}

impl Sandbox {
    fn open(today: NaiveDate) -> Result<Self, AppError> {
        let config = AppConfig::load()?;
        telemetry::init(&config.telemetry)?;

        let store = Arc::new(Store::in_memory());
        let seeded = seed_sample_data(&store, today)?;
        let notifier = MemoryNotifier::default();
        let (manager, queue) = TaskManager::standard(
            store.clone(),
            Arc::new(notifier.clone()),
            config.tasks,
            config.tenancy,
        );

        Ok(Self {
            store,
            manager: Arc::new(manager),
            queue,
            notifier,
            seeded,
        })
    }

    /// Settles the current rent call of each portfolio's long-running lease.
    fn collect_rent(&self, owners: &[TenantStamp], paid_on: NaiveDate) -> Result<usize, AppError> {
        let scoped = self.store.scoped(TenantScope::Unrestricted);
        let period = YearMonth::containing(paid_on);
        let mut collected = 0;

        for portfolio in self
            .seeded
            .iter()
            .filter(|portfolio| owners.contains(&portfolio.owner))
        {
            let Some(&lease_id) = portfolio.leases.first() else {
                continue;
            };
            let payments = scoped.payments().list().map_err(ServiceError::from)?;
            for mut payment in payments.into_iter().filter(|payment| {
                payment.lease_id == lease_id && payment.period == period && !payment.is_settled()
            }) {
                payment.record_settlement(payment.outstanding_cents(), paid_on);
                scoped.payments().update(payment).map_err(ServiceError::from)?;
                collected += 1;
            }
        }

        Ok(collected)
    }

    fn drain(&mut self) -> Vec<Task> {
        self.queue
            .drain(&self.manager)
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(task) => Some(task),
                Err(err) => {
                    println!("  Queued task skipped: {err}");
                    None
                }
            })
            .collect()
    }
}

fn message_for(kind: MessageKind, date: Option<NaiveDate>, period: Option<YearMonth>) -> Message {
    match (date, period) {
        (Some(date), _) => Message::for_date(kind, date),
        (None, Some(period)) => match kind {
            MessageKind::GenerateRent => Message::GenerateRent { period },
            MessageKind::SendRentReceipts => Message::SendRentReceipts { period },
            _ => Message::for_date(kind, period.last_day()),
        },
        (None, None) => Message::for_date(kind, Local::now().date_naive()),
    }
}

pub(crate) fn run_task(args: TaskRunArgs) -> Result<(), AppError> {
    let TaskRunArgs {
        name,
        organization,
        company,
        date,
        period,
    } = args;

    let message = message_for(name, date, period);
    let today = date
        .or_else(|| period.map(|period| period.last_day()))
        .unwrap_or_else(|| Local::now().date_naive());
    let sandbox = Sandbox::open(today)?;
    let actor = operator(organization, company);

    let task = sandbox.manager.execute_now(&actor, message)?;
    print_json(&task.view())
}

pub(crate) fn run_ledger_export(args: LedgerExportArgs) -> Result<(), AppError> {
    let LedgerExportArgs {
        organization,
        company,
        until,
    } = args;

    let until = until.unwrap_or_else(|| Local::now().date_naive());
    let sandbox = Sandbox::open(until)?;
    let actor = operator(organization, company);

    sandbox.manager.execute_now(
        &actor,
        Message::GenerateRent {
            period: YearMonth::containing(until),
        },
    )?;
    let owners: Vec<TenantStamp> = sandbox.seeded.iter().map(|seeded| seeded.owner).collect();
    sandbox.collect_rent(&owners, until)?;
    sandbox
        .manager
        .execute_now(&actor, Message::SyncAccounting { until })?;

    let scoped = sandbox.store.scoped(sandbox.manager.scope_for(&actor));
    let stdout = io::stdout();
    ledger_csv(&scoped, stdout.lock())?;
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        skip_collection,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let period = YearMonth::containing(today);
    let mut sandbox = Sandbox::open(today)?;

    let first_org = operator(1, None);
    let company = operator(1, Some(11));
    let second_org = operator(2, None);
    let members = [
        ("organization 1", &first_org),
        ("company 11", &company),
        ("organization 2", &second_org),
    ];

    println!("Rentwise month-close demo for {period} (as of {today})");

    println!("\nRent calls");
    for (label, actor) in [("organization 1", &first_org), ("organization 2", &second_org)] {
        sandbox
            .manager
            .dispatch(actor, Message::GenerateRent { period })?;
        println!("- queued rent generation for {label}");
    }
    render_tasks(&sandbox.drain());

    if skip_collection {
        println!("\nCollection skipped; every rent call stays open");
    } else {
        let paying = [first_org.scope(), company.scope()]
            .into_iter()
            .filter_map(|scope| owner_of(&sandbox.seeded, scope))
            .collect::<Vec<_>>();
        let collected = sandbox.collect_rent(&paying, today)?;
        println!("\nCollected {collected} rent payment(s) for organization 1");
    }

    println!("\nMonth close");
    for actor in [&first_org, &second_org] {
        sandbox
            .manager
            .dispatch(actor, Message::SendRentReceipts { period })?;
        sandbox
            .manager
            .dispatch(actor, Message::SendRentReminders { as_of: today })?;
        sandbox
            .manager
            .dispatch(actor, Message::SyncAccounting { until: today })?;
    }
    let admin = Actor::super_admin(CLI_OPERATOR);
    sandbox
        .manager
        .dispatch(&admin, Message::CloseExpiredLeases { as_of: today })?;
    render_tasks(&sandbox.drain());

    let reminders = sandbox.notifier.sent();
    if reminders.is_empty() {
        println!("\nReminders: none sent");
    } else {
        println!("\nReminders");
        for reminder in reminders {
            println!(
                "- {} | {} | {} cents outstanding, {} day(s) late",
                reminder.owner, reminder.recipient, reminder.outstanding_cents, reminder.days_overdue
            );
        }
    }

    println!("\nIsolation check (rows visible to each member)");
    for (label, actor) in members {
        let scoped = sandbox.store.scoped(sandbox.manager.scope_for(actor));
        let visible = visible_counts(&scoped).map_err(ServiceError::from)?;
        let tasks = sandbox.manager.list(actor)?.len();
        println!(
            "- {label}: {} leases | {} payments | {} receipts | {} ledger entries | {tasks} tasks",
            visible.leases, visible.payments, visible.documents, visible.entries
        );
    }

    if let Some(task) = sandbox.manager.list(&first_org)?.last() {
        println!("\nLatest organization 1 task payload:");
        print_json(&task.view())?;
    }

    Ok(())
}

fn owner_of(seeded: &[SeededPortfolio], scope: TenantScope) -> Option<TenantStamp> {
    seeded.iter().map(|portfolio| portfolio.owner).find(|owner| {
        match scope {
            TenantScope::Company { company, .. } => owner.company == Some(company),
            TenantScope::Organization { organization } => {
                owner.organization == Some(organization) && owner.company.is_none()
            }
            TenantScope::Unrestricted => false,
        }
    })
}

struct VisibleCounts {
    leases: usize,
    payments: usize,
    documents: usize,
    entries: usize,
}

fn visible_counts(scoped: &ScopedStore<'_>) -> Result<VisibleCounts, StoreError> {
    Ok(VisibleCounts {
        leases: scoped.leases().list()?.len(),
        payments: scoped.payments().list()?.len(),
        documents: scoped.documents().list()?.len(),
        entries: scoped.accounting_entries().list()?.len(),
    })
}

fn render_tasks(tasks: &[Task]) {
    for task in tasks {
        let counts = task
            .summary
            .as_ref()
            .map(|summary| {
                summary
                    .counts()
                    .iter()
                    .map(|(key, count)| format!("{key}={count}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!(
            "  #{} {} [{}] for {} -> {}{}",
            task.id,
            task.kind(),
            task.status,
            task.owner,
            counts,
            task.error
                .as_deref()
                .map(|error| format!(" ({error})"))
                .unwrap_or_default()
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}
