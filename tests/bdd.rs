use std::{collections::HashMap, fmt, sync::Arc};

use anyhow::Context;
use carpool::{
    db::{init_pool, run_migrations},
    models::{
        location::LocationInput,
        passenger::NewPassenger,
        search::TripSearch,
        trip::{NewTrip, Trip, TripStatus},
    },
    services::{
        ledger::{LedgerError, TripLedger},
        sqlite_store::SqliteStore,
        store::MemoryStore,
    },
};
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;

#[derive(Debug, cucumber::World, Default)]
struct LedgerWorld {
    state: Option<TestState>,
    trips: HashMap<String, String>,
    passengers: HashMap<String, String>,
    found: Vec<Trip>,
    last_error: Option<LedgerError>,
}

impl LedgerWorld {
    fn ledger(&self) -> &TripLedger {
        &self
            .state
            .as_ref()
            .expect("ledger must be initialised first")
            .ledger
    }

    fn trip_id(&self, label: &str) -> String {
        self.trips
            .get(label)
            .cloned()
            .unwrap_or_else(|| panic!("unknown trip {label:?}"))
    }

    fn passenger_id(&self, name: &str) -> String {
        self.passengers
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("unknown passenger {name:?}"))
    }

    async fn trip(&self, label: &str) -> Trip {
        self.ledger()
            .get_trip(&self.trip_id(label))
            .await
            .expect("load trip")
    }

    fn record<T>(&mut self, result: Result<T, LedgerError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }
}

struct TestState {
    ledger: TripLedger,
    _root: Option<TempDir>,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    fn in_memory() -> Self {
        Self {
            ledger: TripLedger::new(Arc::new(MemoryStore::new())),
            _root: None,
        }
    }

    async fn sqlite() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());

        let db = init_pool(&database_url).await?;
        run_migrations(&db).await?;

        let store = SqliteStore::new(db, "trips");
        Ok(Self {
            ledger: TripLedger::new(Arc::new(store)),
            _root: Some(root),
        })
    }
}

fn trip_request(from: &str, to: &str, date: &str, time: &str, seats: i64) -> NewTrip {
    NewTrip {
        driver_id: Some("driver-bdd".into()),
        driver_name: Some("Ana Martínez".into()),
        from: Some(LocationInput::new(from, -34.9204948, -57.9535657)),
        to: Some(LocationInput::new(to, -34.6036844, -58.3815591)),
        departure_date: Some(date.into()),
        departure_time: Some(time.into()),
        available_seats: Some(seats),
        price_per_seat: Some(350.0),
        vehicle_model: Some("Toyota RAV4 2023".into()),
        vehicle_color: Some("Rojo".into()),
        license_plate: Some("XYZ-789".into()),
        ..NewTrip::default()
    }
}

fn parse_status(raw: &str) -> TripStatus {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .unwrap_or_else(|_| panic!("unknown trip status {raw:?}"))
}

#[given("an empty in-memory ledger")]
async fn given_memory_ledger(world: &mut LedgerWorld) {
    world.state = Some(TestState::in_memory());
}

#[given("an empty sqlite-backed ledger")]
async fn given_sqlite_ledger(world: &mut LedgerWorld) {
    world.state = Some(TestState::sqlite().await.expect("sqlite state"));
}

#[given(
    regex = r#"^trip "([^"]+)" from "([^"]+)" to "([^"]+)" on (\S+) at (\d\d:\d\d) with (\d+) seats?$"#
)]
async fn given_trip(
    world: &mut LedgerWorld,
    label: String,
    from: String,
    to: String,
    date: String,
    time: String,
    seats: i64,
) {
    let trip = world
        .ledger()
        .create_trip(trip_request(&from, &to, &date, &time, seats))
        .await
        .expect("create trip");
    world.trips.insert(label, trip.id);
}

#[given(regex = r#"^passenger "([^"]+)" booked trip "([^"]+)"$"#)]
async fn given_passenger(world: &mut LedgerWorld, name: String, label: String) {
    let trip_id = world.trip_id(&label);
    let request = NewPassenger {
        user_id: Some(format!("user-{name}")),
        name: Some(name.clone()),
        pickup_location: Some(LocationInput::new("La Plata", -34.92, -57.95)),
        dropoff_location: Some(LocationInput::new("Buenos Aires", -34.60, -58.38)),
        price: Some(350.0),
    };
    let trip = world
        .ledger()
        .book_seat(&trip_id, request)
        .await
        .expect("book seat");
    let booking = trip.passengers.last().expect("booking stored");
    world.passengers.insert(name, booking.id.clone());
}

#[when(regex = r#"^I confirm passenger "([^"]+)" on trip "([^"]+)"$"#)]
async fn when_confirm(world: &mut LedgerWorld, name: String, label: String) {
    let (trip_id, passenger_id) = (world.trip_id(&label), world.passenger_id(&name));
    let result = world.ledger().confirm_passenger(&trip_id, &passenger_id).await;
    world.record(result);
}

#[when(regex = r#"^I cancel passenger "([^"]+)" on trip "([^"]+)"$"#)]
async fn when_cancel(world: &mut LedgerWorld, name: String, label: String) {
    let (trip_id, passenger_id) = (world.trip_id(&label), world.passenger_id(&name));
    let result = world.ledger().cancel_passenger(&trip_id, &passenger_id).await;
    world.record(result);
}

#[when(regex = r#"^I move trip "([^"]+)" to (\w+)$"#)]
async fn when_move(world: &mut LedgerWorld, label: String, status: String) {
    let trip_id = world.trip_id(&label);
    let result = world
        .ledger()
        .update_trip_status(&trip_id, parse_status(&status))
        .await;
    world.record(result);
}

#[when(regex = r#"^I search trips from "([^"]*)"$"#)]
async fn when_search_place(world: &mut LedgerWorld, from: String) {
    let search = TripSearch {
        from_place: Some(from),
        ..TripSearch::default()
    };
    let result = world.ledger().search_trips(search).await;
    world.found = world.record(result).unwrap_or_default();
}

#[when(regex = r#"^I search trips from "([^"]*)" on (\S+)$"#)]
async fn when_search_place_and_day(world: &mut LedgerWorld, from: String, date: String) {
    let search = TripSearch {
        from_place: Some(from),
        date: Some(date),
        ..TripSearch::default()
    };
    let result = world.ledger().search_trips(search).await;
    world.found = world.record(result).unwrap_or_default();
}

#[when(regex = r#"^I search trips on (\S+)$"#)]
async fn when_search_day(world: &mut LedgerWorld, date: String) {
    let search = TripSearch {
        date: Some(date),
        ..TripSearch::default()
    };
    let result = world.ledger().search_trips(search).await;
    world.found = world.record(result).unwrap_or_default();
}

#[when("I list trips")]
async fn when_list(world: &mut LedgerWorld) {
    let result = world.ledger().list_trips().await;
    world.found = world.record(result).unwrap_or_default();
}

#[then(regex = r#"^trip "([^"]+)" has (\d+) remaining seats?$"#)]
async fn then_remaining(world: &mut LedgerWorld, label: String, remaining: i64) {
    let trip = world.trip(&label).await;
    assert_eq!(trip.remaining_seats(), remaining);
    assert!(trip.remaining_seats() >= 0);
    assert!(trip.updated_at >= trip.created_at);
}

#[then("the operation succeeds")]
async fn then_succeeds(world: &mut LedgerWorld) {
    if let Some(err) = &world.last_error {
        panic!("expected success, got {err}");
    }
}

#[then("the operation fails with a capacity error")]
async fn then_capacity(world: &mut LedgerWorld) {
    assert!(
        matches!(world.last_error, Some(LedgerError::Capacity { .. })),
        "got {:?}",
        world.last_error
    );
}

#[then("the operation fails with an invalid transition")]
async fn then_invalid_transition(world: &mut LedgerWorld) {
    assert!(
        matches!(world.last_error, Some(LedgerError::InvalidTransition { .. })),
        "got {:?}",
        world.last_error
    );
}

#[then(regex = r#"^the result lists "([^"]+)"$"#)]
async fn then_result_order(world: &mut LedgerWorld, labels: String) {
    let expected: Vec<String> = labels
        .split(',')
        .map(|label| world.trip_id(label.trim()))
        .collect();
    let actual: Vec<String> = world.found.iter().map(|t| t.id.clone()).collect();
    assert_eq!(actual, expected);
}

#[then("the result is empty")]
async fn then_empty(world: &mut LedgerWorld) {
    assert!(world.found.is_empty(), "found {} trips", world.found.len());
}

#[tokio::main]
async fn main() {
    LedgerWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
