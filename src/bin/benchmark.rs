use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc, Weekday};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::error::Error;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

const STAGE_SECS: u64 = 15;
const RACE_CONTENDERS: usize = 50;

type BoxError = Box<dyn Error + Send + Sync>;

struct Target {
    name: &'static str,
    url: String,
    body: Option<Value>,
}

struct BenchAccount {
    email: String,
    password: String,
    token: String,
    event_type_id: String,
    slug: String,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv::dotenv().ok();
    let base_url = std::env::var("BENCH_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());

    println!("{}", "Starting benchmark suite".bold().green());
    println!("Target URL: {}", base_url);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()?;

    if client.get(format!("{}/health", base_url)).send().await.is_err() {
        eprintln!("{}", format!("Server is not reachable at {}. Start it first.", base_url).red().bold());
        return Ok(());
    }

    println!("\n{}", "Setting up benchmark data...".yellow());
    let account = setup_account(&client, &base_url).await?;
    let date = next_weekday(Weekday::Mon);
    println!("{}", "Data created.".green());
    println!("   Event type: {} ({})", account.slug, account.event_type_id);

    let targets = vec![
        Target {
            name: "Health check",
            url: format!("{}/health", base_url),
            body: None,
        },
        Target {
            name: "Public event type (read)",
            url: format!("{}/api/public/{}", base_url, account.slug),
            body: None,
        },
        Target {
            name: "Slot computation",
            url: format!("{}/api/public/{}/availability?date={}", base_url, account.slug, date),
            body: None,
        },
        Target {
            name: "Login (argon2 verify)",
            url: format!("{}/api/auth/login", base_url),
            body: Some(json!({ "email": account.email, "password": account.password })),
        },
    ];

    let rps_stages = [10, 50, 200, 1000];

    for target in &targets {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking endpoint: {}", target.name.cyan().bold());
        println!("URL: {}", target.url);
        println!("{}", "=".repeat(60));

        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&client, target, rps).await;
        }
    }

    race_probe(&client, &base_url, &account, date).await?;
    Ok(())
}

async fn setup_account(client: &Client, base_url: &str) -> Result<BenchAccount, BoxError> {
    let run_id = Uuid::new_v4().simple().to_string();
    let email = format!("bench-{}@example.com", &run_id[..12]);
    let password = "benchmark-password".to_string();

    let res = client.post(format!("{}/api/auth/signup", base_url))
        .json(&json!({ "email": email, "username": "bench", "password": password }))
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(format!("Signup failed: status {}", res.status()).into());
    }
    let body: Value = res.json().await?;
    let token = body["token"].as_str().ok_or("No token in signup response")?.to_string();

    let slug = format!("bench-{}", &run_id[..12]);
    let res = client.post(format!("{}/api/event-types", base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "Benchmark Meeting", "slug": slug, "duration": 30 }))
        .send()
        .await?;
    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        return Err(format!("Failed to create event type. Status: {}. Body: {}", status, txt).into());
    }
    let body: Value = res.json().await?;
    let event_type_id = body["data"]["id"].as_str().ok_or("No event type id")?.to_string();

    Ok(BenchAccount { email, password, token, event_type_id, slug })
}

async fn run_stage(client: &Client, target: &Target, rps: u32) {
    let Some(rate) = NonZeroU32::new(rps) else { return };
    let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

    let (tx, mut rx) = mpsc::channel(50000);
    let started = Instant::now();
    let stage = Duration::from_secs(STAGE_SECS);

    while started.elapsed() <= stage {
        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let body = target.body.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = match body {
                    Some(b) => client.post(&url).json(&b).send().await,
                    None => client.get(&url).send().await,
                };
                let success = res.map(|r| r.status().is_success()).unwrap_or(false);
                let _ = tx.send((req_start.elapsed(), success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let Ok(mut histogram) = Histogram::<u64>::new(3) else { return };
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        let _ = histogram.record(latency.as_micros() as u64);
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!("{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%", rps, mean_ms, p99_ms, success_rate);

    tokio::time::sleep(Duration::from_millis(500)).await;
}

/// Fires concurrent bookings at one slot; exactly one should win.
async fn race_probe(client: &Client, base_url: &str, account: &BenchAccount, date: NaiveDate) -> Result<(), BoxError> {
    println!("\n{}", "=".repeat(60));
    println!("{}", "Booking race probe".cyan().bold());
    println!("{}", "=".repeat(60));

    let start_time = date.and_hms_opt(10, 0, 0).ok_or("invalid probe time")?.and_utc();
    let mut set = JoinSet::new();

    for i in 0..RACE_CONTENDERS {
        let client = client.clone();
        let url = format!("{}/api/bookings", base_url);
        let body = json!({
            "eventTypeId": account.event_type_id,
            "guestName": format!("Racer {}", i),
            "guestEmail": format!("racer{}@example.com", i),
            "startTime": start_time.to_rfc3339(),
        });
        set.spawn(async move { client.post(&url).json(&body).send().await.map(|r| r.status()) });
    }

    let (mut created, mut conflicts, mut other) = (0, 0, 0);
    while let Some(joined) = set.join_next().await {
        match joined? {
            Ok(StatusCode::CREATED) => created += 1,
            Ok(StatusCode::CONFLICT) => conflicts += 1,
            _ => other += 1,
        }
    }

    println!("{} contenders: {} created, {} conflicts, {} other", RACE_CONTENDERS, created, conflicts, other);
    if created == 1 {
        println!("{}", "Slot reserved exactly once.".green().bold());
    } else {
        println!("{}", format!("Expected exactly one booking, got {}", created).red().bold());
    }

    let res = client.get(format!("{}/api/bookings?upcoming=true", base_url))
        .bearer_auth(&account.token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    let stored = body["data"].as_array().map(|a| a.len()).unwrap_or(0);
    println!("Upcoming bookings stored for the host: {}", stored);

    Ok(())
}

fn next_weekday(weekday: Weekday) -> NaiveDate {
    let mut date = Utc::now().date_naive() + ChronoDuration::days(1);
    while date.weekday() != weekday {
        date += ChronoDuration::days(1);
    }
    date
}
