use uuid::Uuid;

use crate::models::{
    location::LocationInput,
    trip::{Conversation, LuggageSize, NewTrip, Preferences},
};

struct DemoTrip {
    driver: &'static str,
    from: (&'static str, f64, f64),
    to: (&'static str, f64, f64),
    date: &'static str,
    departure: &'static str,
    arrival: &'static str,
    seats: i64,
    price: f64,
    vehicle: (&'static str, &'static str, &'static str),
    preferences: Preferences,
    description: &'static str,
    luggage: LuggageSize,
}

const DEMO_TRIPS: [DemoTrip; 5] = [
    DemoTrip {
        driver: "Carlos Rodríguez",
        from: ("Castelli", -36.0895596, -57.8019104),
        to: ("Burzaco", -34.8286232, -58.39333420000001),
        date: "2025-04-20",
        departure: "08:00",
        arrival: "11:30",
        seats: 3,
        price: 250.0,
        vehicle: ("Honda Civic 2022", "Azul", "ABC-123"),
        preferences: Preferences {
            smoking: false,
            pets: false,
            music: true,
            conversation: Conversation::Chatty,
        },
        description: "Viaje cómodo con aire acondicionado. Salida puntual.",
        luggage: LuggageSize::Medium,
    },
    DemoTrip {
        driver: "Ana Martínez",
        from: ("La Plata", -34.9204948, -57.9535657),
        to: ("Buenos Aires", -34.6036844, -58.3815591),
        date: "2025-04-22",
        departure: "09:30",
        arrival: "10:45",
        seats: 4,
        price: 350.0,
        vehicle: ("Toyota RAV4 2023", "Rojo", "XYZ-789"),
        preferences: Preferences {
            smoking: false,
            pets: true,
            music: true,
            conversation: Conversation::Depends,
        },
        description: "Viaje directo por autopista. Auto espacioso y cómodo.",
        luggage: LuggageSize::Large,
    },
    DemoTrip {
        driver: "Miguel Ángel Torres",
        from: ("Mar del Plata", -38.0054771, -57.5426106),
        to: ("Tandil", -37.3211582, -59.082458),
        date: "2025-04-21",
        departure: "17:00",
        arrival: "19:30",
        seats: 2,
        price: 150.0,
        vehicle: ("Volkswagen Golf 2021", "Negro", "MDP-456"),
        preferences: Preferences {
            smoking: false,
            pets: false,
            music: false,
            conversation: Conversation::Quiet,
        },
        description: "Viaje tranquilo después del trabajo. Prefiero poco ruido.",
        luggage: LuggageSize::Small,
    },
    DemoTrip {
        driver: "Sofía Vargas",
        from: ("Rosario", -32.9442426, -60.6505388),
        to: ("Córdoba", -31.4200833, -64.1887761),
        date: "2025-04-23",
        departure: "06:30",
        arrival: "10:30",
        seats: 3,
        price: 400.0,
        vehicle: ("Nissan Sentra 2022", "Plata", "ROS-901"),
        preferences: Preferences {
            smoking: false,
            pets: false,
            music: true,
            conversation: Conversation::Chatty,
        },
        description: "Viaje matutino. Café gratis para todos.",
        luggage: LuggageSize::Medium,
    },
    DemoTrip {
        driver: "Roberto Gómez",
        from: ("Castelli", -36.0895596, -57.8019104),
        to: ("Capital Federal", -34.6036844, -58.3815591),
        date: "2025-04-25",
        departure: "10:00",
        arrival: "14:00",
        seats: 4,
        price: 300.0,
        vehicle: ("Mazda CX-5 2023", "Blanco", "BA-567"),
        preferences: Preferences {
            smoking: false,
            pets: true,
            music: true,
            conversation: Conversation::Depends,
        },
        description: "Viaje directo con una parada para estirar las piernas.",
        luggage: LuggageSize::Large,
    },
];

/// The fixed demonstration dataset, each trip under a fresh driver id.
pub fn demo_trips() -> Vec<NewTrip> {
    DEMO_TRIPS
        .iter()
        .map(|demo| NewTrip {
            driver_id: Some(Uuid::new_v4().to_string()),
            driver_name: Some(demo.driver.into()),
            from: Some(LocationInput::new(demo.from.0, demo.from.1, demo.from.2)),
            to: Some(LocationInput::new(demo.to.0, demo.to.1, demo.to.2)),
            departure_date: Some(demo.date.into()),
            departure_time: Some(demo.departure.into()),
            estimated_arrival_time: Some(demo.arrival.into()),
            route: None,
            available_seats: Some(demo.seats),
            price_per_seat: Some(demo.price),
            vehicle_model: Some(demo.vehicle.0.into()),
            vehicle_color: Some(demo.vehicle.1.into()),
            license_plate: Some(demo.vehicle.2.into()),
            preferences: Some(demo.preferences),
            description: Some(demo.description.into()),
            luggage_allowed: Some(true),
            max_luggage_size: Some(demo.luggage),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn every_demo_trip_validates() {
        let now = Utc::now();
        let trips = demo_trips()
            .into_iter()
            .map(|req| req.into_trip(now))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(trips.len(), 5);
        assert!(trips.iter().all(|t| t.passengers.is_empty()));
        assert_ne!(trips[0].driver_id, trips[4].driver_id);
    }
}
