use fancy_regex::Regex;
use std::sync::LazyLock;
use uia_locator_core::types::Point;

static COORDINATES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*/{0,2}cords\[\s*(\d+)\s*,\s*(\d+)\s*\]\s*$").ok());

/// Recognises a literal screen point such as `//cords[120,340]`.
///
/// The whole branch must be the coordinate form; it never composes with path
/// segments. Components that do not fit an `i32` are not coordinates.
pub fn parse_coordinates(text: &str) -> Option<Point> {
    let regex = COORDINATES.as_ref()?;
    let captures = regex.captures(text).ok()??;
    let x = captures.get(1)?.as_str().parse().ok()?;
    let y = captures.get(2)?.as_str().parse().ok()?;
    Some(Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("//cords[120,340]", Some(Point::new(120, 340)))]
    #[case("//CORDS[0,0]", Some(Point::new(0, 0)))]
    #[case("cords[ 5 , 7 ]", Some(Point::new(5, 7)))]
    #[case("/cords[1,2]", Some(Point::new(1, 2)))]
    #[case("//cords[-1,2]", None)]
    #[case("//cords[1]", None)]
    #[case("//Window/cords[1,2]", None)]
    #[case("//cords[1,2]/Button", None)]
    #[case("//cords[99999999999,1]", None)]
    fn recognises_only_the_literal_form(#[case] input: &str, #[case] expected: Option<Point>) {
        assert_eq!(parse_coordinates(input), expected);
    }
}
