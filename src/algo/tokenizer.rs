use unicode_segmentation::UnicodeSegmentation;

/// Tokenize text into lowercase word tokens, filtering stopwords and
/// single-character tokens. Apostrophes split a word, so contractions and
/// possessives keep only their 2+ character parts.
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .flat_map(|w| w.split(['\'', '\u{2019}']))
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= 2 && !is_stopword(w))
        .collect()
}

/// Stopword test: standard English list, calendar words, and a handful of
/// short Spanish/French/German function words common in listings.
pub fn is_stopword(word: &str) -> bool {
    is_english_stopword(word) || is_calendar_word(word) || is_foreign_function_word(word)
}

fn is_calendar_word(word: &str) -> bool {
    matches!(
        word,
        "january" | "february" | "march" | "april" | "may" | "june" | "july" | "august"
        | "september" | "october" | "november" | "december" | "jan" | "feb" | "mar" | "apr"
        | "jun" | "jul" | "aug" | "sep" | "sept" | "oct" | "nov" | "dec" | "monday"
        | "tuesday" | "wednesday" | "thursday" | "friday" | "saturday" | "sunday"
    )
}

fn is_foreign_function_word(word: &str) -> bool {
    matches!(
        word,
        "de" | "la" | "el" | "en" | "los" | "las" | "del" | "que" | "por" | "con" | "para"
        | "le" | "les" | "des" | "du" | "et" | "une" | "un" | "der" | "die" | "das" | "und"
    )
}

fn is_english_stopword(word: &str) -> bool {
    matches!(
        word,
        "a" | "about" | "above" | "across" | "after" | "afterwards" | "again" | "against"
        | "all" | "almost" | "alone" | "along" | "already" | "also" | "although" | "always"
        | "am" | "among" | "amongst" | "amoungst" | "amount" | "an" | "and" | "another"
        | "any" | "anyhow" | "anyone" | "anything" | "anyway" | "anywhere" | "are"
        | "around" | "as" | "at" | "back" | "be" | "became" | "because" | "become"
        | "becomes" | "becoming" | "been" | "before" | "beforehand" | "behind" | "being"
        | "below" | "beside" | "besides" | "between" | "beyond" | "bill" | "both"
        | "bottom" | "but" | "by" | "call" | "can" | "cannot" | "cant" | "co" | "con"
        | "could" | "couldnt" | "cry" | "describe" | "detail" | "do" | "done" | "down"
        | "due" | "during" | "each" | "eg" | "eight" | "either" | "eleven" | "else"
        | "elsewhere" | "empty" | "enough" | "etc" | "even" | "ever" | "every"
        | "everyone" | "everything" | "everywhere" | "except" | "few" | "fifteen"
        | "fifty" | "fill" | "find" | "fire" | "first" | "five" | "for" | "former"
        | "formerly" | "forty" | "found" | "four" | "from" | "front" | "full" | "further"
        | "get" | "give" | "go" | "had" | "has" | "hasnt" | "have" | "he" | "hence"
        | "her" | "here" | "hereafter" | "hereby" | "herein" | "hereupon" | "hers"
        | "herself" | "him" | "himself" | "his" | "how" | "however" | "hundred" | "i"
        | "ie" | "if" | "in" | "inc" | "indeed" | "interest" | "into" | "is" | "it"
        | "its" | "itself" | "keep" | "last" | "latter" | "latterly" | "least" | "less"
        | "ltd" | "made" | "many" | "me" | "meanwhile" | "might" | "mill"
        | "mine" | "more" | "moreover" | "most" | "mostly" | "move" | "much" | "must"
        | "my" | "myself" | "name" | "namely" | "neither" | "never" | "nevertheless"
        | "next" | "nine" | "no" | "nobody" | "none" | "noone" | "nor" | "not"
        | "nothing" | "now" | "nowhere" | "of" | "off" | "often" | "on" | "once" | "one"
        | "only" | "onto" | "or" | "other" | "others" | "otherwise" | "our" | "ours"
        | "ourselves" | "out" | "over" | "own" | "part" | "per" | "perhaps" | "please"
        | "put" | "rather" | "re" | "same" | "see" | "seem" | "seemed" | "seeming"
        | "seems" | "serious" | "several" | "she" | "should" | "show" | "side" | "since"
        | "sincere" | "six" | "sixty" | "so" | "some" | "somehow" | "someone"
        | "something" | "sometime" | "sometimes" | "somewhere" | "still" | "such"
        | "system" | "take" | "ten" | "than" | "that" | "the" | "their" | "them"
        | "themselves" | "then" | "thence" | "there" | "thereafter" | "thereby"
        | "therefore" | "therein" | "thereupon" | "these" | "they" | "thick" | "thin"
        | "third" | "this" | "those" | "though" | "three" | "through" | "throughout"
        | "thru" | "thus" | "to" | "together" | "too" | "top" | "toward" | "towards"
        | "twelve" | "twenty" | "two" | "under" | "until" | "up" | "upon" | "us"
        | "very" | "via" | "was" | "we" | "well" | "were" | "what" | "whatever" | "when"
        | "whence" | "whenever" | "where" | "whereafter" | "whereas" | "whereby"
        | "wherein" | "whereupon" | "wherever" | "whether" | "which" | "while"
        | "whither" | "who" | "whoever" | "whole" | "whom" | "whose" | "why" | "will"
        | "with" | "within" | "without" | "would" | "yet" | "you" | "your" | "yours"
        | "yourself" | "yourselves"
    )
}
