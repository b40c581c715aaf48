use std::path::Path;
use std::path::PathBuf;

use yaml_rust::Yaml;

use super::RouteOptError;


pub fn str_to_absolute_path(path_str: &str, default_base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        return path;
    } else {
        return [default_base_dir, Path::new(&path)].iter().collect();
    }
}

fn missing(key: &str) -> RouteOptError {
    RouteOptError::config(key, "missing or of the wrong type")
}

/// Accepts integers too, since yaml has no way to write `3` as a float.
pub fn get_f64(yaml: &Yaml, key: &str) -> Result<f64, RouteOptError> {
    match &yaml[key] {
        Yaml::Real(_) => yaml[key].as_f64().ok_or_else(|| missing(key)),
        Yaml::Integer(ii) => Ok(*ii as f64),
        _ => Err(missing(key)),
    }
}

pub fn get_usize(yaml: &Yaml, key: &str) -> Result<usize, RouteOptError> {
    let value = yaml[key].as_i64().ok_or_else(|| missing(key))?;
    if value < 0 {
        return Err(RouteOptError::config(key, format!("{} is negative", value)));
    }
    Ok(value as usize)
}

pub fn get_u32(yaml: &Yaml, key: &str) -> Result<u32, RouteOptError> {
    let value = get_usize(yaml, key)?;
    if value > u32::MAX as usize {
        return Err(RouteOptError::config(key, format!("{} is too large", value)));
    }
    Ok(value as u32)
}

pub fn get_str<'a>(yaml: &'a Yaml, key: &str) -> Result<&'a str, RouteOptError> {
    yaml[key].as_str().ok_or_else(|| missing(key))
}

pub fn get_bool_or(yaml: &Yaml, key: &str, default: bool) -> Result<bool, RouteOptError> {
    if yaml[key].is_badvalue() {
        return Ok(default);
    }
    yaml[key].as_bool().ok_or_else(|| missing(key))
}

pub fn get_section<'a>(yaml: &'a Yaml, key: &str) -> Result<&'a Yaml, RouteOptError> {
    let section = &yaml[key];
    match section {
        Yaml::Hash(_) => Ok(section),
        _ => Err(missing(key)),
    }
}


#[cfg(test)]
mod tests {
    use yaml_rust::YamlLoader;

    use super::*;

    #[test]
    fn test_absolute_paths() {
        let base = Path::new("/data/runs");
        assert_eq!(str_to_absolute_path("dists.csv", base),
                   PathBuf::from("/data/runs/dists.csv"));
        assert_eq!(str_to_absolute_path("/tmp/dists.csv", base),
                   PathBuf::from("/tmp/dists.csv"));
    }

    #[test]
    fn test_scalar_getters() {
        let docs = YamlLoader::load_from_str("a: 3\nb: 0.5\nc: hello\nd: true\ne: -2\n")
            .unwrap();
        let yaml = &docs[0];
        assert_eq!(get_f64(yaml, "a").unwrap(), 3.);
        assert_eq!(get_f64(yaml, "b").unwrap(), 0.5);
        assert_eq!(get_usize(yaml, "a").unwrap(), 3);
        assert_eq!(get_u32(yaml, "a").unwrap(), 3);
        assert_eq!(get_str(yaml, "c").unwrap(), "hello");
        assert_eq!(get_bool_or(yaml, "d", false).unwrap(), true);
        assert_eq!(get_bool_or(yaml, "zz", false).unwrap(), false);

        assert!(get_usize(yaml, "e").is_err());
        assert!(get_usize(yaml, "b").is_err());
        assert!(get_f64(yaml, "c").is_err());
        assert!(get_str(yaml, "missing").is_err());
        assert!(get_section(yaml, "a").is_err());
    }
}
