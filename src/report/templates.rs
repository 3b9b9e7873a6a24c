//! Raw tera templates for the static HTML report.
//!
//! Pages extend `base.html` and receive a `root` variable holding the
//! relative path back to the destination root, so the same navigation works
//! from nested entity directories.

use tera::Tera;

use crate::error::Result;

pub(crate) const STYLESHEET: &str = "\
body { font-family: sans-serif; margin: 0; color: #222; }
nav { background: #2a2a2a; padding: 0.6em 1em; }
nav a { color: #eee; margin-right: 1.2em; text-decoration: none; }
main { padding: 1em 2em; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 0.4em 0.7em; text-align: left; }
th { background: #f0f0f0; }
pre { background: #f7f7f7; border: 1px solid #ddd; padding: 1em; overflow-x: auto; }
.status-ok { color: #2e7d32; }
.status-changed { color: #f9a825; }
.status-failed, .status-unreachable { color: #c62828; }
.status-skipped { color: #00838f; }
";

const BASE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{% block title %}playback{% endblock %}</title>
  <link rel="stylesheet" href="{{ root }}/static/style.css">
</head>
<body>
  <nav>
    <a href="{{ root }}/index.html">Playbooks</a>
    <a href="{{ root }}/host/index.html">Hosts</a>
    <a href="{{ root }}/result/index.html">Results</a>
    <a href="{{ root }}/file/index.html">Files</a>
    <a href="{{ root }}/reports/index.html">Reports</a>
  </nav>
  <main>
{% block content %}{% endblock %}
  </main>
</body>
</html>
"#;

const INDEX: &str = r#"{% extends "base.html" %}
{% block title %}Playbooks{% endblock %}
{% block content %}
  <h1>Recorded playbooks</h1>
  <table>
    <tr><th>ID</th><th>Path</th><th>Status</th><th>Started</th><th>Duration</th></tr>
    {% for playbook in playbooks %}
    <tr>
      <td>{% if multi %}<a href="{{ root }}/playbook/{{ playbook.id }}/index.html">{{ playbook.id }}</a>{% else %}{{ playbook.id }}{% endif %}</td>
      <td>{{ playbook.path }}</td>
      <td>{{ playbook.status }}</td>
      <td>{{ playbook.started_at }}</td>
      <td>{{ playbook.duration }}</td>
    </tr>
    {% endfor %}
  </table>
{% endblock %}
"#;

const PLAYBOOK: &str = r#"{% extends "base.html" %}
{% block title %}Playbook {{ playbook.id }}{% endblock %}
{% block content %}
  <h1>{{ playbook.path }}</h1>
  <p>{{ playbook.status }}, started {{ playbook.started_at }} ({{ playbook.duration }})</p>
  <h2>Plays</h2>
  <table>
    <tr><th>ID</th><th>Name</th></tr>
    {% for play in plays %}
    <tr><td>{{ play.id }}</td><td>{{ play.name }}</td></tr>
    {% endfor %}
  </table>
  <h2>Tasks</h2>
  <table>
    <tr><th>ID</th><th>Name</th><th>Action</th><th>Source</th></tr>
    {% for task in tasks %}
    <tr><td>{{ task.id }}</td><td>{{ task.name }}</td><td>{{ task.action }}</td><td>{{ task.path }}:{{ task.lineno }}</td></tr>
    {% endfor %}
  </table>
{% endblock %}
"#;

const HOST_INDEX: &str = r#"{% extends "base.html" %}
{% block title %}Hosts{% endblock %}
{% block content %}
  <h1>Hosts</h1>
  <table>
    <tr><th>ID</th><th>Name</th><th>Playbook</th></tr>
    {% for host in hosts %}
    <tr><td><a href="{{ root }}/host/{{ host.id }}">{{ host.id }}</a></td><td>{{ host.name }}</td><td>{{ host.playbook_id }}</td></tr>
    {% endfor %}
  </table>
{% endblock %}
"#;

const HOST: &str = r#"{% extends "base.html" %}
{% block title %}Host {{ host.name }}{% endblock %}
{% block content %}
  <h1>{{ host.name }}</h1>
  <p>Playbook {{ host.playbook_id }}</p>
  {% if facts %}<h2>Facts</h2><pre>{{ facts }}</pre>{% else %}<p>No facts recorded.</p>{% endif %}
{% endblock %}
"#;

const RESULT_INDEX: &str = r#"{% extends "base.html" %}
{% block title %}Results{% endblock %}
{% block content %}
  <h1>Results</h1>
  <table>
    <tr><th>ID</th><th>Status</th><th>Task</th><th>Host</th><th>Duration</th></tr>
    {% for result in results %}
    <tr>
      <td><a href="{{ root }}/result/{{ result.id }}">{{ result.id }}</a></td>
      <td class="status-{{ result.status }}">{{ result.status }}</td>
      <td>{{ result.task }}</td>
      <td>{{ result.host }}</td>
      <td>{{ result.duration }}</td>
    </tr>
    {% endfor %}
  </table>
{% endblock %}
"#;

const RESULT: &str = r#"{% extends "base.html" %}
{% block title %}Result {{ result.id }}{% endblock %}
{% block content %}
  <h1>Result {{ result.id }}</h1>
  <p><span class="status-{{ result.status }}">{{ result.status }}</span>
     - task "{{ result.task }}" ({{ result.action }}) on {{ result.host }}</p>
  <h2>Output</h2>
  <pre>{{ payload }}</pre>
{% endblock %}
"#;

const FILE_INDEX: &str = r#"{% extends "base.html" %}
{% block title %}Files{% endblock %}
{% block content %}
  <h1>Files</h1>
  <table>
    <tr><th>ID</th><th>Path</th><th>Playbook</th></tr>
    {% for file in files %}
    <tr><td><a href="{{ root }}/file/{{ file.id }}">{{ file.id }}</a></td><td>{{ file.path }}</td><td>{{ file.playbook_id }}</td></tr>
    {% endfor %}
  </table>
{% endblock %}
"#;

const FILE: &str = r#"{% extends "base.html" %}
{% block title %}{{ file.path }}{% endblock %}
{% block content %}
  <h1>{{ file.path }}</h1>
  <pre>{{ file.content }}</pre>
{% endblock %}
"#;

const REPORTS: &str = r#"{% extends "base.html" %}
{% block title %}Reports{% endblock %}
{% block content %}
  <h1>Run reports</h1>
  <table>
    <tr><th>Playbook</th><th>Path</th><th>OK</th><th>Changed</th><th>Failed</th><th>Skipped</th><th>Unreachable</th></tr>
    {% for report in reports %}
    <tr>
      <td>{{ report.id }}</td>
      <td>{{ report.path }}</td>
      <td class="status-ok">{{ report.ok }}</td>
      <td class="status-changed">{{ report.changed }}</td>
      <td class="status-failed">{{ report.failed }}</td>
      <td class="status-skipped">{{ report.skipped }}</td>
      <td class="status-unreachable">{{ report.unreachable }}</td>
    </tr>
    {% endfor %}
  </table>
{% endblock %}
"#;

pub(crate) fn engine() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", BASE),
        ("index.html", INDEX),
        ("playbook.html", PLAYBOOK),
        ("host_index.html", HOST_INDEX),
        ("host.html", HOST),
        ("result_index.html", RESULT_INDEX),
        ("result.html", RESULT),
        ("file_index.html", FILE_INDEX),
        ("file.html", FILE),
        ("reports.html", REPORTS),
    ])?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        let tera = engine().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"index.html"));
        assert!(names.contains(&"reports.html"));
    }
}
