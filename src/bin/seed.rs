use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use reelrec::models::{NewMovie, NewUser};
use reelrec::services::store::{MovieStore, SnapshotSource};
use reelrec::{init_tracing, Config};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Seed for the generated watch history.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

fn sample_movies() -> Vec<NewMovie> {
    let entries: [(&str, &str, i32, i32, &str); 27] = [
        ("The Shawshank Redemption", "Drama", 1994, 142, "Two imprisoned men bond over a number of years"),
        ("The Godfather", "Drama, Crime", 1972, 175, "The aging patriarch of an organized crime dynasty"),
        ("Forrest Gump", "Drama", 1994, 142, "The life journey of a man with low intelligence"),
        ("The Dark Knight", "Action, Crime, Drama", 2008, 152, "When the menace known as the Joker wreaks havoc"),
        ("Inception", "Action, Sci-Fi", 2010, 148, "A thief who steals corporate secrets through dream-sharing technology"),
        ("The Matrix", "Action, Sci-Fi", 1999, 136, "A computer programmer discovers a mysterious world"),
        ("Mad Max: Fury Road", "Action, Adventure", 2015, 120, "A woman rebels against a tyrannical ruler"),
        ("The Hangover", "Comedy", 2009, 100, "Three friends wake up from a bachelor party"),
        ("Superbad", "Comedy", 2007, 113, "Two high school friends try to buy alcohol for a party"),
        ("Deadpool", "Comedy, Action", 2016, 108, "A former Special Forces operative turned mercenary"),
        ("Interstellar", "Sci-Fi, Adventure", 2014, 169, "A team of explorers travel through a wormhole in space"),
        ("The Martian", "Sci-Fi, Adventure", 2015, 144, "An astronaut is left behind on Mars"),
        ("Arrival", "Sci-Fi, Drama", 2016, 116, "A linguist works with the military to communicate with alien lifeforms"),
        ("The Shining", "Horror", 1980, 146, "A family heads to an isolated hotel for the winter"),
        ("A Quiet Place", "Horror, Drama", 2018, 90, "A family must live in silence to avoid mysterious creatures"),
        ("Get Out", "Horror, Mystery", 2017, 104, "A young man visits his girlfriend's mysterious family estate"),
        ("The Notebook", "Romance, Drama", 2004, 123, "A poor yet passionate young man falls in love with a rich young woman"),
        ("La La Land", "Romance, Musical", 2016, 128, "A jazz pianist falls for an aspiring actress in Los Angeles"),
        ("500 Days of Summer", "Romance, Comedy", 2009, 95, "A man reflects on his relationship with a woman"),
        ("Se7en", "Thriller, Crime", 1995, 127, "Two detectives track a serial killer"),
        ("Gone Girl", "Thriller, Drama", 2014, 149, "A man becomes the prime suspect in his wife's disappearance"),
        ("Shutter Island", "Thriller, Mystery", 2010, 138, "A U.S. Marshal investigates the disappearance of a patient"),
        ("Spirited Away", "Animation, Adventure", 2001, 125, "A young girl wanders into a world ruled by gods and spirits"),
        ("The Lion King", "Animation, Adventure", 1994, 88, "Lion prince Simba and his father are targeted by his bitter uncle"),
        ("Up", "Animation, Adventure", 2009, 96, "An elderly widower sets out to fulfill his lifelong dream"),
        ("Planet Earth", "Documentary", 2006, 550, "A documentary series about the diversity of habitats around the world"),
        ("Free Solo", "Documentary", 2018, 100, "A documentary about a free solo climb of El Capitan"),
    ];

    entries
        .into_iter()
        .map(|(title, genre, release_year, duration, description)| NewMovie {
            title: title.to_string(),
            genre: genre.to_string(),
            release_year,
            duration,
            description: description.to_string(),
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing().await;

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    let store = MovieStore::connect(&config.database).await?;

    info!("Resetting database schema");
    store.reset().await?;

    let mut user_ids = Vec::new();
    for i in 1..=20 {
        let user = store
            .create_user(&NewUser {
                username: format!("user_{}", i),
                email: format!("user_{}@example.com", i),
            })
            .await?;
        user_ids.push(user.id);
    }

    let mut movie_ids = Vec::new();
    for new_movie in sample_movies() {
        let movie = store.create_movie(&new_movie).await?;
        movie_ids.push(movie.id);
    }

    // Each user rates a random sample of the catalog, between 1.0 and 5.0
    // in half-star-ish tenths.
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut rating_count = 0;
    for &user_id in &user_ids {
        let watched = rng.gen_range(10..=20.min(movie_ids.len()));
        for &movie_id in movie_ids.choose_multiple(&mut rng, watched) {
            let rating = (rng.gen_range(1.0..=5.0f32) * 10.0).round() / 10.0;
            store.upsert_rating(user_id, movie_id, rating).await?;
            rating_count += 1;
        }
    }

    let snapshot = store.snapshot().await?;
    info!(
        "Seeded {} users, {} movies, {} ratings",
        user_ids.len(),
        snapshot.movies.len(),
        rating_count
    );

    Ok(())
}
