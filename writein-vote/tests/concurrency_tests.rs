//! Concurrent vote casting
//!
//! Many tasks hit one database at once; every invariant must hold
//! regardless of interleaving.

use futures::future::join_all;
use sqlx::SqlitePool;
use tempfile::TempDir;
use writein_common::db::{init_database, Voter, MAX_CANDIDATES};
use writein_vote::db::{candidates, voters};
use writein_vote::voting::{
    audit_tallies, fetch_results, FailureReason, VoteCaster, VoteResult, WriteInDenial,
};

async fn setup(seeds: &[&str]) -> (TempDir, SqlitePool, VoteCaster) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("writein.db")).await.unwrap();
    let seeds: Vec<String> = seeds.iter().map(|s| s.to_string()).collect();
    candidates::seed_candidates(&pool, &seeds).await.unwrap();
    let caster = VoteCaster::new(pool.clone()).with_lock_wait_ms(30_000);
    (dir, pool, caster)
}

async fn make_voters(pool: &SqlitePool, count: usize) -> Vec<Voter> {
    let mut result = Vec::with_capacity(count);
    for i in 0..count {
        let email = format!("voter{}@example.com", i);
        result.push(voters::create_voter(pool, &email, "12345", "pw").await.unwrap());
    }
    result
}

/// Cast every (voter, name) pair on its own task and collect the outcomes
async fn cast_all(caster: &VoteCaster, ballots: Vec<(Voter, String)>) -> Vec<VoteResult> {
    let handles = ballots.into_iter().map(|(voter, name)| {
        let caster = caster.clone();
        tokio::spawn(async move { caster.cast_vote(&voter, &name).await })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect()
}

async fn vote_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM votes")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_voter_votes_once() {
    let (_dir, pool, caster) = setup(&["Adele"]).await;
    let voter = make_voters(&pool, 1).await.remove(0);

    let ballots = (0..16).map(|_| (voter.clone(), "Adele".to_string())).collect();
    let results = cast_all(&caster, ballots).await;

    let successes = results.iter().filter(|r| r.is_success()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter(|r| !r.is_success())
        .all(|r| *r == VoteResult::Failure(FailureReason::AlreadyVoted)));

    assert_eq!(vote_rows(&pool).await, 1);
    assert!(audit_tallies(&pool).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tallies_match_votes_under_load() {
    let seeds = ["Adele", "Drake", "Hozier"];
    let (_dir, pool, caster) = setup(&seeds).await;
    let voters = make_voters(&pool, 30).await;

    let ballots = voters
        .into_iter()
        .enumerate()
        .map(|(i, voter)| (voter, seeds[i % seeds.len()].to_lowercase()))
        .collect();
    let results = cast_all(&caster, ballots).await;

    assert!(results.iter().all(|r| r.is_success()), "{:?}", results);
    assert_eq!(vote_rows(&pool).await, 30);
    assert!(audit_tallies(&pool).await.unwrap().is_empty());

    let standings = fetch_results(&pool).await.unwrap();
    assert_eq!(standings.len(), 3);
    assert!(standings.iter().all(|entry| entry.votes == 10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cap_holds_with_concurrent_write_ins() {
    let seeds = [
        "Adele",
        "Beyonce",
        "Coldplay",
        "Drake",
        "Eminem",
        "Fleetwood Mac",
        "Gorillaz",
        "Hozier",
        "Imagine Dragons",
    ];
    let write_ins = [
        "Kraftwerk", "Lorde", "Metallica", "Nirvana", "Outkast", "Queen", "Radiohead", "Sade",
    ];
    let (_dir, pool, caster) = setup(&seeds).await;
    let voters = make_voters(&pool, write_ins.len()).await;

    let ballots = voters
        .into_iter()
        .zip(write_ins.iter())
        .map(|(voter, name)| (voter, name.to_string()))
        .collect();
    let results = cast_all(&caster, ballots).await;

    let successes = results.iter().filter(|r| r.is_success()).count();
    assert_eq!(successes, 1, "{:?}", results);
    assert!(results.iter().filter(|r| !r.is_success()).all(|r| {
        *r == VoteResult::Failure(FailureReason::WriteInDenied(WriteInDenial::TooManyCandidates))
    }));

    let all = candidates::list_candidates(&pool).await.unwrap();
    assert_eq!(all.len() as i64, MAX_CANDIDATES);

    // Losers were rolled back entirely
    assert_eq!(vote_rows(&pool).await, 1);
    let voted: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM voters WHERE voted_at IS NOT NULL")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(voted, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_new_name_creates_one_candidate() {
    let (_dir, pool, caster) = setup(&[]).await;
    let voters = make_voters(&pool, 12).await;

    let ballots = voters
        .into_iter()
        .map(|voter| (voter, "dj synth".to_string()))
        .collect();
    let results = cast_all(&caster, ballots).await;

    assert!(results.iter().all(|r| r.is_success()), "{:?}", results);

    let all = candidates::list_candidates(&pool).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Dj Synth");
    assert_eq!(all[0].votes, 12);

    // Exactly one voter is credited with the write-in
    let nominators: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM voters WHERE write_in_id IS NOT NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(nominators, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_write_in_per_voter() {
    let (_dir, pool, caster) = setup(&[]).await;
    let voter = make_voters(&pool, 1).await.remove(0);

    let names = ["Kraftwerk", "Lorde", "Metallica", "Nirvana", "Outkast"];
    let ballots = names
        .iter()
        .map(|name| (voter.clone(), name.to_string()))
        .collect();
    let results = cast_all(&caster, ballots).await;

    assert_eq!(results.iter().filter(|r| r.is_success()).count(), 1);
    assert_eq!(candidates::list_candidates(&pool).await.unwrap().len(), 1);

    let nominated: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE nominated_by = ?")
            .bind(voter.id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(nominated, 1);
}
