//! Text menu over any async line reader / writer: login or register, then
//! list movies, book tickets, view bookings. Every failure is printed and
//! control returns to the menu.

use std::fmt::Display;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::models::seat::join_labels;
use crate::services::reservation::Availability;
use crate::AppState;

pub struct Console<R, W> {
    input: R,
    output: W,
    state: Arc<AppState>,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, state: Arc<AppState>) -> Self {
        Self { input, output, state }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs until the user exits or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        self.say("Welcome to the Movie Booking System").await?;
        let Some(user) = self.sign_in().await? else {
            return Ok(());
        };

        loop {
            self.say("\nMenu\n1. List Movies\n2. Book Tickets\n3. View My Bookings\n4. Exit").await?;
            let Some(choice) = self.prompt("Choose option: ").await? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.list_movies().await?,
                "2" => self.book(&user).await?,
                "3" => self.view_bookings(&user).await?,
                "4" => {
                    self.say("Goodbye!").await?;
                    return Ok(());
                }
                _ => self.say("Invalid choice.").await?,
            }
        }
    }

    async fn sign_in(&mut self) -> io::Result<Option<String>> {
        let state = self.state.clone();
        loop {
            self.say("\n1. Login\n2. Register").await?;
            let Some(choice) = self.prompt("Choose option: ").await? else {
                return Ok(None);
            };
            match choice.as_str() {
                "1" => {
                    let Some(name) = self.prompt("Enter username: ").await? else {
                        return Ok(None);
                    };
                    match state.accounts.login(&name).await {
                        Ok(user) => return Ok(Some(user)),
                        Err(e) => self.report(e).await?,
                    }
                }
                "2" => {
                    let Some(name) = self.prompt("Choose a username: ").await? else {
                        return Ok(None);
                    };
                    match state.accounts.register(&name).await {
                        Ok(user) => {
                            self.say("User registered successfully.").await?;
                            return Ok(Some(user));
                        }
                        Err(e) => self.report(e).await?,
                    }
                }
                _ => self.say("Invalid choice.").await?,
            }
        }
    }

    async fn list_movies(&mut self) -> io::Result<()> {
        let state = self.state.clone();
        let groups = state.catalog.list_movies();
        if groups.is_empty() {
            return self.say("No movies available.").await;
        }
        for group in groups {
            self.say(format!("\n{} Movies:", group.genre)).await?;
            for movie in group.movies {
                self.say(format!(
                    "ID: {}, Name: {}, Screen: {}, Showtimes: {}, Price: {}",
                    movie.movie_id,
                    movie.name,
                    movie.screen,
                    movie.showtimes.join(", "),
                    self.money(movie.price)
                ))
                .await?;
            }
        }
        Ok(())
    }

    async fn book(&mut self, user: &str) -> io::Result<()> {
        let state = self.state.clone();
        let engine = &state.engine;

        let Some(movie_id) = self.prompt("Enter Movie ID: ").await? else {
            return Ok(());
        };
        let movie = match state.catalog.find_movie(&movie_id) {
            Ok(movie) => movie,
            Err(e) => return self.report(e).await,
        };
        for (i, showtime) in movie.showtimes.iter().enumerate() {
            self.say(format!("{}. {}", i + 1, showtime)).await?;
        }
        let Some(selection) = self.prompt("Choose showtime number: ").await? else {
            return Ok(());
        };

        let availability = match engine.availability(&movie_id, &selection).await {
            Ok(availability) => availability,
            Err(e) => return self.report(e).await,
        };
        self.show_seat_map(&availability).await?;

        let Some(raw) = self.prompt("Enter seats to book (comma separated): ").await? else {
            return Ok(());
        };
        let labels: Vec<&str> = raw.split(',').collect();
        let quote = match engine.quote(user, &movie_id, &selection, &labels).await {
            Ok(quote) => quote,
            Err(e) => return self.report(e).await,
        };

        self.say(format!("\nBooking Summary for {}:", quote.username())).await?;
        self.say(format!(
            "Movie: {}, Showtime: {}, Seats: {}, Total: {}",
            quote.movie_name(),
            quote.session().showtime,
            join_labels(quote.seats(), ", "),
            self.money(quote.total())
        ))
        .await?;

        let question = "Confirm booking? (y/n): ";
        let answer = match engine.policy().confirm_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.prompt(question)).await {
                Ok(answer) => answer?,
                Err(_) => {
                    // A late answer is not consumed here; the menu will see it
                    self.say(format!(
                        "\nNo answer within {}s, confirmation timed out. Anything typed now goes to the menu.",
                        limit.as_secs()
                    ))
                    .await?;
                    None
                }
            },
            None => self.prompt(question).await?,
        };
        let confirmed = answer.is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes"));
        if !confirmed {
            return self.say("Booking cancelled.").await;
        }

        match engine.commit(quote).await {
            Ok(booking) => {
                if let Some(cache) = &state.cache {
                    cache.invalidate(&booking.session).await;
                }
                self.say(format!("Booking confirmed! Reference {}", booking.id)).await
            }
            Err(e) => self.report(e).await,
        }
    }

    async fn view_bookings(&mut self, user: &str) -> io::Result<()> {
        let state = self.state.clone();
        let bookings = match state.engine.bookings_for(user).await {
            Ok(bookings) => bookings,
            Err(e) => return self.report(e).await,
        };
        if bookings.is_empty() {
            return self.say("No bookings found.").await;
        }
        for (i, booking) in bookings.iter().enumerate() {
            self.say(format!(
                "{}. {} | {} | Seats: {} | {}",
                i + 1,
                booking.movie_name,
                booking.session.showtime,
                booking.seat_labels(),
                self.money(booking.total)
            ))
            .await?;
        }
        Ok(())
    }

    async fn show_seat_map(&mut self, availability: &Availability) -> io::Result<()> {
        self.say("\nSeat Map (X = Booked, O = Available):").await?;
        for (row, markers) in availability.grid.iter().enumerate() {
            let cells: Vec<String> = markers.iter().map(ToString::to_string).collect();
            // rows are capped at 26, so the letter stays in A..=Z
            let letter = char::from(b'A' + row as u8);
            self.say(format!("{} | {}", letter, cells.join(" "))).await?;
        }
        self.say(format!("{} of {} seats available", availability.available(), availability.capacity))
            .await
    }

    fn money(&self, amount: impl Display) -> String {
        format!("{}{}", self.state.config.app.currency_symbol, amount)
    }

    async fn report(&mut self, error: impl Display) -> io::Result<()> {
        self.say(format!("Error: {error}")).await
    }

    async fn say(&mut self, line: impl AsRef<str>) -> io::Result<()> {
        self.output.write_all(line.as_ref().as_bytes()).await?;
        self.output.write_all(b"\n").await
    }

    async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::Config;
    use crate::models::Movie;
    use crate::seat_grid::SeatGrid;
    use crate::store::{MemoryLedger, MemoryUserDirectory};

    fn state() -> Arc<AppState> {
        state_with(|_| None)
    }

    fn state_with(lookup: impl Fn(&str) -> Option<String>) -> Arc<AppState> {
        let config = Config::from_lookup(lookup).unwrap();
        let catalog = Catalog::new(vec![Movie {
            movie_id: "M1".to_string(),
            name: "Arrival".to_string(),
            genre: "Sci-Fi".to_string(),
            screen: "1".to_string(),
            showtimes: vec!["10:00 AM".to_string(), "9:30 PM".to_string()],
            price: 200,
        }])
        .unwrap();
        AppState::from_parts(
            config,
            catalog,
            Arc::new(MemoryLedger::new()),
            Arc::new(MemoryUserDirectory::with_users(["alice"])),
            SeatGrid::default(),
            None,
        )
    }

    async fn run_script(state: Arc<AppState>, script: &str) -> String {
        let mut console = Console::new(script.as_bytes(), Vec::new(), state);
        console.run().await.unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    #[tokio::test]
    async fn books_and_lists_seats() {
        let state = state();
        let out = run_script(state.clone(), "1\nalice\n2\nM1\n1\na1, A2\ny\n3\n4\n").await;

        assert!(out.contains("Seat Map (X = Booked, O = Available):"));
        assert!(out.contains("Movie: Arrival, Showtime: 10:00 AM, Seats: A1, A2, Total: ₹400"));
        assert!(out.contains("Booking confirmed!"));
        assert!(out.contains("1. Arrival | 10:00 AM | Seats: A1;A2 | ₹400"));
        assert!(out.ends_with("Goodbye!\n"));

        let bookings = state.engine.bookings_for("alice").await.unwrap();
        assert_eq!(bookings.len(), 1);
    }

    #[tokio::test]
    async fn declining_confirmation_books_nothing() {
        let state = state();
        let out = run_script(state.clone(), "1\nalice\n2\nM1\n2\nB5\nn\n3\n4\n").await;
        assert!(out.contains("Booking cancelled."));
        assert!(out.contains("No bookings found."));
    }

    #[tokio::test]
    async fn errors_return_to_menu() {
        let out = run_script(state(), "2\nbob\n2\nM9\n2\nM1\n99\n2\nM1\n1\nZ9\n4\n").await;
        assert!(out.contains("User registered successfully."));
        assert!(out.contains("Error: movie 'M9' not found"));
        assert!(out.contains("Error: invalid showtime selection '99'"));
        assert!(out.contains("Error: invalid seat label(s): Z9"));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn unknown_user_must_retry_login() {
        let out = run_script(state(), "1\nmallory\n1\nalice\n1\n4\n").await;
        assert!(out.contains("Error: user 'mallory' not found"));
        assert!(out.contains("Sci-Fi Movies:"));
        assert!(out.contains("ID: M1, Name: Arrival, Screen: 1, Showtimes: 10:00 AM, 9:30 PM, Price: ₹200"));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_confirmation_times_out_and_says_so() {
        let state = state_with(|key| (key == "CONFIRM_TIMEOUT_SECS").then(|| "5".to_string()));
        let (mut keyboard, input) = tokio::io::duplex(256);
        let mut console = Console::new(tokio::io::BufReader::new(input), Vec::new(), state.clone());
        let session = tokio::spawn(async move {
            console.run().await.unwrap();
            console.into_output()
        });

        keyboard.write_all(b"1\nalice\n2\nM1\n1\nA1\n").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        // The late "y" lands on the menu, not on the expired question
        keyboard.write_all(b"y\n3\n4\n").await.unwrap();

        let out = String::from_utf8(session.await.unwrap()).unwrap();
        assert!(out.contains("No answer within 5s, confirmation timed out."));
        assert!(out.contains("Booking cancelled."));
        assert!(out.contains("Invalid choice."));
        assert!(out.contains("No bookings found."));
        assert!(state.engine.bookings_for("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_of_input_exits_quietly() {
        let out = run_script(state(), "1\nalice\n").await;
        assert!(out.contains("Choose option: "));
    }
}
