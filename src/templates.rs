pub fn package_json(name: &str) -> String {
    format!(
        "{{\n  \"name\": \"{name}\",\n  \"version\": \"0.1.0\",\n  \"private\": true,\n  \"scripts\": {{\n    \"dev\": \"easyweb server dev\",\n    \"build\": \"easyweb build prod\"\n  }},\n  \"devDependencies\": {{\n    \"webpack\": \"^5.0.0\",\n    \"webpack-cli\": \"^5.0.0\",\n    \"webpack-dev-server\": \"^4.0.0\"\n  }}\n}}\n"
    )
}

pub fn webpack_config_json() -> String {
    "{\n  \"type\": [\"client\"],\n  \"entry\": {\n    \"index\": \"./src/index.js\"\n  },\n  \"env\": {\n    \"dev\": { \"devtool\": \"eval-source-map\" },\n    \"prod\": { \"optimization\": { \"minimize\": true } }\n  }\n}\n"
        .to_string()
}

pub fn index_js(name: &str) -> String {
    format!("document.title = '{name}';\n")
}

pub fn npmrc(registry: &str) -> String {
    format!("registry={registry}\n")
}
