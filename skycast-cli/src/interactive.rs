use anyhow::Result;
use inquire::{InquireError, Text};
use skycast_core::{Presenter, WeatherClient, WeatherQuery};

/// What the user typed at the city prompt.
#[derive(Debug, PartialEq)]
enum Input {
    City(String),
    Quit,
}

fn parse_input(line: &str) -> Input {
    let city = line.trim();
    if city.is_empty() || city.eq_ignore_ascii_case("quit") {
        Input::Quit
    } else {
        Input::City(city.to_string())
    }
}

/// Prompt for cities until the user quits. A failed lookup never ends the loop.
pub async fn run(client: &WeatherClient, presenter: &Presenter) -> Result<()> {
    println!("🌤️  Weather CLI App Started");

    loop {
        let line = match Text::new("Enter city name (or 'quit' to exit):").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let city = match parse_input(&line) {
            Input::Quit => {
                println!("Goodbye 👋");
                return Ok(());
            }
            Input::City(city) => city,
        };

        match client.lookup(&WeatherQuery::City(city)).await {
            Some(report) => {
                if let Err(e) = presenter.display(&report) {
                    eprintln!("Unexpected error: {e}");
                }
            }
            None => println!("⚠️  Could not retrieve weather data."),
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_and_blank_end_the_loop() {
        assert_eq!(parse_input("quit"), Input::Quit);
        assert_eq!(parse_input("  QUIT "), Input::Quit);
        assert_eq!(parse_input(""), Input::Quit);
        assert_eq!(parse_input("   "), Input::Quit);
    }

    #[test]
    fn city_is_trimmed() {
        assert_eq!(parse_input("  New York "), Input::City("New York".into()));
        assert_eq!(parse_input("Quito"), Input::City("Quito".into()));
    }
}
