//! Sequential playback of a list of clips.

/// What [`Playlist::on_playback_complete`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistEvent {
    /// Moved to the item at this index.
    Advanced(usize),
    /// Wrapped from the last item back to the first.
    Looped,
    /// Reached the end with looping off (or the list is empty).
    Finished,
}

/// Ordered list of items played one after another.
#[derive(Debug, Clone)]
pub struct Playlist<T> {
    items: Vec<T>,
    active: usize,
    loop_from_end: bool,
    finished: bool,
}

impl<T> Playlist<T> {
    /// Start at the first item.
    #[must_use]
    pub fn new(items: Vec<T>, loop_from_end: bool) -> Self {
        let finished = items.is_empty();
        Self {
            items,
            active: 0,
            loop_from_end,
            finished,
        }
    }

    /// The item playing now, or `None` once playback has finished.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        if self.finished {
            None
        } else {
            self.items.get(self.active)
        }
    }

    /// Index of the current item.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Whether playback stopped at the end of the list.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the list wraps around at the end.
    #[must_use]
    pub fn loops(&self) -> bool {
        self.loop_from_end
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in play order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Call when the current item finished playing.
    pub fn on_playback_complete(&mut self) -> PlaylistEvent {
        if self.finished {
            return PlaylistEvent::Finished;
        }
        let next = self.active + 1;
        if next < self.items.len() {
            self.active = next;
            PlaylistEvent::Advanced(next)
        } else if self.loop_from_end {
            self.active = 0;
            PlaylistEvent::Looped
        } else {
            self.finished = true;
            PlaylistEvent::Finished
        }
    }

    /// Go back to the first item.
    pub fn restart(&mut self) {
        self.active = 0;
        self.finished = self.items.is_empty();
    }
}

impl Playlist<String> {
    /// Playlist of URLs with share links rewritten to direct downloads.
    #[must_use]
    pub fn from_urls<I, S>(urls: I, loop_from_end: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = urls
            .into_iter()
            .map(|url| normalize_share_url(url.as_ref()))
            .collect();
        Self::new(items, loop_from_end)
    }
}

/// Rewrite a Dropbox "copy link" URL into its direct-download form.
///
/// `https://www.dropbox.com/s/<id>/clip.mp4?dl=0` becomes
/// `https://dl.dropbox.com/s/<id>/clip.mp4?dl=1`. Other URLs are returned
/// unchanged.
#[must_use]
pub fn normalize_share_url(url: &str) -> String {
    let url = url.trim();
    if !url.contains("dropbox.com") {
        return url.to_owned();
    }
    let host_fixed = url.replacen("www.dropbox.com", "dl.dropbox.com", 1);
    match host_fixed.split_once('?') {
        Some((path, query)) => {
            let query: Vec<&str> = query
                .split('&')
                .map(|pair| if pair == "dl=0" { "dl=1" } else { pair })
                .collect();
            format!("{path}?{}", query.join("&"))
        }
        None => host_fixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_items_without_loop_stop_at_end() {
        let mut playlist = Playlist::new(vec!["a", "b", "c"], false);
        assert_eq!(playlist.current(), Some(&"a"));
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Advanced(1));
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Advanced(2));
        assert_eq!(playlist.current(), Some(&"c"));
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Finished);
        assert_eq!(playlist.current(), None);
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Finished);
        assert_eq!(playlist.active_index(), 2);
    }

    #[test]
    fn looping_wraps_to_first() {
        let mut playlist = Playlist::new(vec![1, 2], true);
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Advanced(1));
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Looped);
        assert_eq!(playlist.current(), Some(&1));
        assert!(!playlist.is_finished());
    }

    #[test]
    fn empty_playlist_is_finished() {
        let mut playlist: Playlist<u8> = Playlist::new(Vec::new(), true);
        assert!(playlist.is_finished());
        assert_eq!(playlist.current(), None);
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Finished);
    }

    #[test]
    fn restart_after_finish() {
        let mut playlist = Playlist::new(vec!["x"], false);
        assert_eq!(playlist.on_playback_complete(), PlaylistEvent::Finished);
        playlist.restart();
        assert_eq!(playlist.current(), Some(&"x"));
    }

    #[test]
    fn share_links_become_direct_downloads() {
        assert_eq!(
            normalize_share_url(
                "https://www.dropbox.com/s/pv1i9mq3w5bv3fb/clip.mp4?dl=0"
            ),
            "https://dl.dropbox.com/s/pv1i9mq3w5bv3fb/clip.mp4?dl=1"
        );
        assert_eq!(
            normalize_share_url("https://example.com/v.mp4?dl=0"),
            "https://example.com/v.mp4?dl=0"
        );
        let playlist = Playlist::from_urls(
            ["https://www.dropbox.com/s/x/a.mp4?raw=1&dl=0"],
            false,
        );
        assert_eq!(
            playlist.items()[0],
            "https://dl.dropbox.com/s/x/a.mp4?raw=1&dl=1"
        );
    }
}
