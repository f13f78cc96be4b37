use rand::seq::SliceRandom;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

pub const QUOTES: &[Quote] = &[
    Quote {
        text: "We are what we repeatedly do. Excellence, then, is not an act, but a habit.",
        author: "Will Durant",
    },
    Quote {
        text: "The secret of getting ahead is getting started.",
        author: "Mark Twain",
    },
    Quote {
        text: "It does not matter how slowly you go as long as you do not stop.",
        author: "Confucius",
    },
    Quote {
        text: "Small deeds done are better than great deeds planned.",
        author: "Peter Marshall",
    },
    Quote {
        text: "Motivation is what gets you started. Habit is what keeps you going.",
        author: "Jim Ryun",
    },
    Quote {
        text: "A journey of a thousand miles begins with a single step.",
        author: "Lao Tzu",
    },
    Quote {
        text: "You'll never change your life until you change something you do daily.",
        author: "John C. Maxwell",
    },
    Quote {
        text: "Success is the sum of small efforts, repeated day in and day out.",
        author: "Robert Collier",
    },
];

/// Pick a quote for the day, uniformly at random.
pub fn random_quote() -> Quote {
    let mut rng = rand::thread_rng();
    QUOTES.choose(&mut rng).copied().unwrap_or(QUOTES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_bundled_set_is_never_empty() {
        assert!(!QUOTES.is_empty());
        let quote = random_quote();
        assert!(!quote.text.is_empty());
        assert!(!quote.author.is_empty());
    }
}
