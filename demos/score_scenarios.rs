//! Score every synthetic scenario and print the trips

use tripscore::{Scenario, TripProcessor};

fn main() {
    let mut processor = TripProcessor::new();
    let mut start_ms = 1_705_320_000_000;

    for scenario in Scenario::ALL {
        let samples = scenario.generate(start_ms);
        start_ms += samples.len() as i64 * 1_000 + 3_600_000;

        for trip in processor.process_samples(&samples) {
            match serde_json::to_string(&trip) {
                Ok(json) => println!("{scenario}: {json}"),
                Err(e) => eprintln!("Error: {e:?}"),
            }
        }
    }
}
