// src/utils/html.rs

/// Turns an HTML fragment from the trivia API into plain display text.
///
/// Markup is stripped with ammonia (no tags allowed), then every entity is
/// decoded, so `It&#039;s &quot;<i>fine</i>&quot;` becomes `It's "fine"`.
pub fn decode_html(input: &str) -> String {
    let text_only = ammonia::Builder::empty().clean(input).to_string();
    html_escape::decode_html_entities(&text_only).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(decode_html("What is &quot;HTML&quot;?"), "What is \"HTML\"?");
        assert_eq!(decode_html("It&#039;s a trap"), "It's a trap");
        assert_eq!(decode_html("Pok&eacute;mon"), "Pokémon");
        assert_eq!(decode_html("Rock &amp; Roll"), "Rock & Roll");
    }

    #[test]
    fn strips_markup_but_keeps_text() {
        assert_eq!(decode_html("<b>Bold</b> move"), "Bold move");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(decode_html("5 < 6 and 7 > 3"), "5 < 6 and 7 > 3");
        assert_eq!(decode_html("Plain answer"), "Plain answer");
    }
}
