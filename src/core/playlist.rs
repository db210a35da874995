use crate::domain::model::Track;
use crate::utils::error::{PlayerError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const DEFAULT_SOURCE: &[(&str, &str)] = &[
    ("Head in the clouds", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/1.mp3"),
    ("Un Amico", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/2.mp3"),
    ("Death bed", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/3.mp3"),
    ("Luv(sic.)pt3", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/4.mp3"),
    ("Repeat until death", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/5.mp3"),
    ("The Void", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/music/6.mp3"),
    ("Come Here", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/music/8.mp3"),
    ("空とぶ宅急便", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/music/9.mp3"),
    ("你听得到——编曲", "https://jsd.cdn.zzko.cn/gh/jayneysil520-dev/jayneysil@main/music/13.mp3"),
];

/// Built-in source list used when the configuration declares no tracks.
pub fn default_tracks() -> Vec<Track> {
    DEFAULT_SOURCE
        .iter()
        .map(|(title, url)| Track::new(*title, *url))
        .collect()
}

/// Session playlist: a fixed permutation of the source list, never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    /// Fisher–Yates permutation of `source` driven by `rng`.
    pub fn shuffled<R: Rng + ?Sized>(source: &[Track], rng: &mut R) -> Result<Self> {
        let mut tracks = source.to_vec();
        tracks.shuffle(rng);
        Self::in_order(tracks)
    }

    /// Shuffles once for a session; a seed makes the order reproducible.
    pub fn for_session(source: &[Track], seed: Option<u64>) -> Result<Self> {
        let playlist = match seed {
            Some(seed) => Self::shuffled(source, &mut StdRng::seed_from_u64(seed))?,
            None => Self::shuffled(source, &mut rand::rng())?,
        };
        tracing::debug!(
            "session playlist: {:?}",
            playlist.tracks.iter().map(|t| t.title.as_str()).collect::<Vec<_>>()
        );
        Ok(playlist)
    }

    /// Keeps the given order.
    pub fn in_order(tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut tracks: Vec<Track>) -> Vec<Track> {
        tracks.sort_by(|a, b| a.url.cmp(&b.url));
        tracks
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let source = default_tracks();
        for seed in 0..64 {
            let playlist = Playlist::for_session(&source, Some(seed)).unwrap();
            assert_eq!(playlist.len(), source.len());
            assert_eq!(sorted(playlist.tracks().to_vec()), sorted(source.clone()));
        }
    }

    #[test]
    fn test_unseeded_shuffle_is_a_permutation() {
        let source = default_tracks();
        let playlist = Playlist::for_session(&source, None).unwrap();
        assert_eq!(sorted(playlist.tracks().to_vec()), sorted(source));
    }

    #[test]
    fn test_seeded_sessions_are_reproducible() {
        let source = default_tracks();
        let a = Playlist::for_session(&source, Some(42)).unwrap();
        let b = Playlist::for_session(&source, Some(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_source_is_rejected() {
        assert!(matches!(
            Playlist::for_session(&[], Some(1)),
            Err(PlayerError::EmptyPlaylist)
        ));
    }

    #[test]
    fn test_next_index_wraps() {
        let playlist = Playlist::in_order(default_tracks()[..3].to_vec()).unwrap();
        assert_eq!(playlist.next_index(0), 1);
        assert_eq!(playlist.next_index(1), 2);
        assert_eq!(playlist.next_index(2), 0);
    }
}
